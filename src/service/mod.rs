//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services run the authorization guard and the moderation gate
//! before touching the identity store or the database.

mod account;
pub mod conversation;
mod identity;
mod messaging;
pub mod moderation;
mod notification;
mod social;
mod stories;

pub use account::{AccountCommand, AccountService, AccountUpdate, FollowToggle};
pub use conversation::ConversationSummary;
pub use identity::{DEFAULT_AVATAR, IdentityStore, Signup};
pub use messaging::{MessageLog, MessagingService, SendMessage};
pub use moderation::{ModerationGate, VerificationRequest};
pub use notification::NotificationService;
pub use social::{CreateComment, CreatePost, PostService, PostView};
pub use stories::{ConfessionService, CreateStory, StoryService};
