pub mod booking;
pub mod order;
pub mod request;
pub mod service;
pub mod user;

pub use booking::{Booking, BookingStatus};
pub use order::{Order, OrderStatus};
pub use request::{Request, RequestStatus};
pub use service::{Service, ServiceField};
pub use user::User;
