//! Domain models with validation at construction
//!
//! User input is validated when these types are built; invalid input is a
//! [`ValidationError`], never a panic.

pub mod follow;
pub mod image;
pub mod message;
pub mod org;
pub mod owner;
pub mod pagination;
pub mod topic;
pub mod user;
pub mod validation;

pub use follow::{Follow, FollowEdge};
pub use image::{Image, NewImage};
pub use message::{Message, MessageContent, MessageFilter, NewMessage};
pub use org::{NewOrg, Org, OrgMember, OrgRole};
pub use owner::{Owner, OwnerBacking, OwnerKind, OwnerProfile, OwnerSummary};
pub use pagination::{Page, PageParams, PageRequest};
pub use topic::{build_tree, NewTopic, Topic, TopicNode};
pub use user::{validate_name, Email, NewUser, Password, ProfileUpdate, User, UserCredentials};
pub use validation::ValidationError;
