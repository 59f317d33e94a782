pub mod seat;

pub use seat::{Seat, SeatId, SeatStatus};
