//! REST access to the EventSphere backend.

mod client;
mod endpoints;
pub mod models;

pub use client::{seg, ApiClient, UnauthorizedHook};
pub use endpoints::{
    AnalyticsApi, Api, AttendeeApi, AuthApi, BoothApi, ExhibitorApi, ExpoApi, FeedbackApi, MessageApi,
    NotificationApi, ScheduleApi, UploadApi, UserApi, DEFAULT_UPLOAD_FOLDER,
};
