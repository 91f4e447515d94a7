pub mod backend;
pub mod marketplace;
pub mod models;
pub mod state;
pub mod view;

mod memory;
pub use memory::{MemoryBackend, Operation};

pub use backend::{AuthEvents, AuthSubscription, Backend, BackendError};
pub use marketplace::{Marketplace, Notice, NoticeLevel};
pub use models::{
    AuthChange, AuthEvent, AuthUser, Interest, NewService, Order, Profile, Service, ServiceId,
    Session, Table, UserMetadata,
};
pub use state::{DraftField, ServiceDraft};
pub use view::{ListingStatus, ListingView, ServiceCard, EMPTY_LISTING_TEXT};
