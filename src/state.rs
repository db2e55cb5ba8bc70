use crate::config::AppConfig;
use crate::services::booking::BookingService;

pub struct AppState {
    pub bookings: BookingService,
    pub config: AppConfig,
}
