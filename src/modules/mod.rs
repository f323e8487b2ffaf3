pub mod blogs;
pub mod comments;
pub mod health;
pub mod likes;
pub mod users;

pub use self::blogs::model::Blog;
pub use self::comments::model::Comment;
pub use self::users::model::User;
