pub mod availability;
pub mod booking;

pub use availability::{is_valid_date, BookedSlot};
pub use booking::{
    Booking, BookingPatch, BookingStatus, CreateBookingRequest, Customer, CustomerInput,
    NewBooking, WildcardPolicy, ANY_STYLIST,
};
