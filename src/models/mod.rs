pub mod geo;
pub mod post;
pub mod user;

pub use geo::{GeoPoint, Region, Subscription, TimeWindow};
pub use post::{Comment, FeedPost, PostAuthor, PostDetail, PostWithAuthor};
pub use user::{Profile, PublicUser, User};
