//! One client per backend resource.
//!
//! Most endpoints are a verb, a path template and at most one body or query,
//! so they are declared through `endpoints!`. The few that build their own
//! body or read raw bytes are written out below the declarations.

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{json, Value};

use super::client::{seg, ApiClient};
use super::models::*;
use crate::error::AppResult;
use crate::identity::{Role, User};

macro_rules! endpoints {
    (@send $c:expr, $path:ident, GET) => { $c.get(&$path).await };
    (@send $c:expr, $path:ident, GET query($q:ident)) => { $c.get_query(&$path, $q).await };
    (@send $c:expr, $path:ident, POST) => { $c.post_empty(&$path).await };
    (@send $c:expr, $path:ident, POST body($b:ident)) => { $c.post(&$path, $b).await };
    (@send $c:expr, $path:ident, PUT) => { $c.put_empty(&$path).await };
    (@send $c:expr, $path:ident, PUT body($b:ident)) => { $c.put(&$path, $b).await };
    (@send $c:expr, $path:ident, DELETE) => { $c.delete(&$path).await };
    ($(
        $(#[$smeta:meta])*
        $api:ident {
            $(
                $(#[$meta:meta])*
                fn $name:ident($($arg:ident : $ty:ty),* $(,)?) -> $ret:ty
                    = $verb:ident $fmt:literal $([$($p:ident),+])? $($kind:ident($extra:ident))?;
            )*
        }
    )*) => {
        $(
            $(#[$smeta])*
            #[derive(Clone)]
            pub struct $api {
                client: Arc<ApiClient>,
            }

            impl $api {
                pub fn new(client: Arc<ApiClient>) -> Self { Self { client } }

                $(
                    $(#[$meta])*
                    pub async fn $name(&self, $($arg: $ty),*) -> AppResult<$ret> {
                        let path = format!($fmt $($(, seg(&$p))+)?);
                        endpoints!(@send (&self.client), path, $verb $($kind($extra))?)
                    }
                )*
            }
        )*
    };
}

endpoints! {
    /// `/auth`: sign-in, registration and the signed-in user's account.
    AuthApi {
        fn login(credentials: &Credentials) -> AuthPayload = POST "auth/login" body(credentials);
        fn register(form: &RegisterRequest) -> AuthPayload = POST "auth/register" body(form);
        fn logout() -> Value = POST "auth/logout";
        fn forgot_password(req: &ForgotPasswordRequest) -> Value = POST "auth/forgot-password" body(req);
        fn reset_password(token: &str, req: &ResetPasswordRequest) -> AuthPayload
            = POST "auth/reset-password/{}" [token] body(req);
        fn me() -> UserPayload = GET "auth/me";
        fn update_profile(patch: &ProfileUpdate) -> UserPayload = PUT "auth/profile" body(patch);
        fn change_password(req: &ChangePasswordRequest) -> Value = PUT "auth/change-password" body(req);
    }

    UserApi {
        fn list() -> Vec<User> = GET "users";
        fn get(id: &str) -> User = GET "users/{}" [id];
        fn update(id: &str, patch: &Value) -> User = PUT "users/{}" [id] body(patch);
        fn delete(id: &str) -> Value = DELETE "users/{}" [id];
        fn by_role(role: Role) -> Vec<User> = GET "users/role/{}" [role];
    }

    ExpoApi {
        fn list(query: &ExpoQuery) -> Vec<Expo> = GET "expos" query(query);
        fn get(id: &str) -> Expo = GET "expos/{}" [id];
        fn create(draft: &ExpoDraft) -> Expo = POST "expos" body(draft);
        fn update(id: &str, draft: &ExpoDraft) -> Expo = PUT "expos/{}" [id] body(draft);
        fn delete(id: &str) -> Value = DELETE "expos/{}" [id];
        fn my() -> Vec<Expo> = GET "expos/my";
        fn public() -> Vec<Expo> = GET "expos/public";
        fn register(id: &str) -> Value = POST "expos/{}/register" [id];
        fn analytics(id: &str) -> Value = GET "expos/{}/analytics" [id];
    }

    BoothApi {
        fn list(expo_id: &str) -> Vec<Booth> = GET "expos/{}/booths" [expo_id];
        fn get(id: &str) -> Booth = GET "booths/{}" [id];
        fn create(expo_id: &str, booth: &Value) -> Booth = POST "expos/{}/booths" [expo_id] body(booth);
        fn update(id: &str, booth: &Value) -> Booth = PUT "booths/{}" [id] body(booth);
        fn delete(id: &str) -> Value = DELETE "booths/{}" [id];
        fn reserve(id: &str, reservation: &Value) -> Booth = POST "booths/{}/reserve" [id] body(reservation);
        fn available(expo_id: &str) -> Vec<Booth> = GET "expos/{}/booths/available" [expo_id];
        fn my() -> Vec<Booth> = GET "booths/my";
    }

    /// Exhibitor applications and company profiles.
    ExhibitorApi {
        fn list(expo_id: &str) -> Vec<ExhibitorProfile> = GET "expos/{}/exhibitors" [expo_id];
        fn get(id: &str) -> ExhibitorProfile = GET "exhibitors/{}" [id];
        fn apply(application: &Value) -> ExhibitorProfile = POST "exhibitors/apply" body(application);
        fn update(id: &str, application: &Value) -> ExhibitorProfile = PUT "exhibitors/{}" [id] body(application);
        fn delete(id: &str) -> Value = DELETE "exhibitors/{}" [id];
        fn approve(id: &str) -> ExhibitorProfile = POST "exhibitors/{}/approve" [id];
        fn reject(id: &str) -> ExhibitorProfile = POST "exhibitors/{}/reject" [id];
        fn my() -> Vec<ExhibitorProfile> = GET "exhibitors/my";
        fn applications(expo_id: &str) -> Vec<ExhibitorProfile> = GET "expos/{}/applications" [expo_id];
        fn analytics(id: &str) -> Value = GET "exhibitors/{}/analytics" [id];
        fn update_profile(profile: &Value) -> ExhibitorProfile = PUT "exhibitors/profile" body(profile);
    }

    AttendeeApi {
        fn list(expo_id: &str) -> Vec<User> = GET "expos/{}/attendees" [expo_id];
        fn get(id: &str) -> User = GET "attendees/{}" [id];
        fn register(expo_id: &str, registration: &Value) -> Registration
            = POST "expos/{}/register" [expo_id] body(registration);
        fn check_in(expo_id: &str) -> Registration = POST "expos/{}/check-in" [expo_id];
        fn my_registrations() -> Vec<Registration> = GET "attendees/registrations";
        fn update_profile(profile: &Value) -> Value = PUT "attendees/profile" body(profile);
        fn analytics() -> Value = GET "attendees/analytics";
        fn networking() -> Value = GET "attendees/networking";
        fn connect(exhibitor_id: &str) -> Value = POST "attendees/connect/{}" [exhibitor_id];
    }

    /// Talks and workshops on an expo's agenda.
    ScheduleApi {
        fn list(expo_id: &str) -> Vec<ScheduleSession> = GET "expos/{}/sessions" [expo_id];
        fn get(id: &str) -> ScheduleSession = GET "sessions/{}" [id];
        fn create(expo_id: &str, session: &Value) -> ScheduleSession
            = POST "expos/{}/sessions" [expo_id] body(session);
        fn update(id: &str, session: &Value) -> ScheduleSession = PUT "sessions/{}" [id] body(session);
        fn delete(id: &str) -> Value = DELETE "sessions/{}" [id];
        fn book(id: &str) -> Value = POST "sessions/{}/book" [id];
        fn cancel_booking(id: &str) -> Value = DELETE "sessions/{}/booking" [id];
        fn my_bookings() -> Vec<ScheduleSession> = GET "sessions/bookings";
        fn add_feedback(id: &str, feedback: &Value) -> Value = POST "sessions/{}/feedback" [id] body(feedback);
        fn attendees(id: &str) -> Vec<User> = GET "sessions/{}/attendees" [id];
    }

    /// Support tickets.
    FeedbackApi {
        fn list() -> Vec<Feedback> = GET "feedback";
        fn create(feedback: &FeedbackDraft) -> Feedback = POST "feedback" body(feedback);
        fn update(id: &str, feedback: &Value) -> Feedback = PUT "feedback/{}" [id] body(feedback);
        fn delete(id: &str) -> Value = DELETE "feedback/{}" [id];
        fn get(id: &str) -> Feedback = GET "feedback/{}" [id];
        fn close(id: &str) -> Feedback = POST "feedback/{}/close" [id];
    }

    MessageApi {
        fn list() -> Vec<Message> = GET "messages";
        fn get(id: &str) -> Message = GET "messages/{}" [id];
        fn send(message: &Value) -> Message = POST "messages" body(message);
        fn mark_read(id: &str) -> Value = PUT "messages/{}/read" [id];
        fn delete(id: &str) -> Value = DELETE "messages/{}" [id];
        fn conversation(user_id: &str) -> Vec<Message> = GET "messages/conversation/{}" [user_id];
        fn unread_count() -> UnreadCount = GET "messages/unread-count";
    }

    AnalyticsApi {
        fn dashboard() -> Value = GET "analytics/dashboard";
        fn expo(expo_id: &str) -> Value = GET "analytics/expo/{}" [expo_id];
        fn exhibitor(exhibitor_id: &str) -> Value = GET "analytics/exhibitor/{}" [exhibitor_id];
        fn attendee() -> Value = GET "analytics/attendee";
        fn revenue() -> Value = GET "analytics/revenue";
        fn engagement() -> Value = GET "analytics/engagement";
    }

    NotificationApi {
        fn list() -> Vec<Notification> = GET "notifications";
        fn mark_read(id: &str) -> Value = PUT "notifications/{}/read" [id];
        fn mark_all_read() -> Value = PUT "notifications/read-all";
        fn delete(id: &str) -> Value = DELETE "notifications/{}" [id];
        fn unread_count() -> UnreadCount = GET "notifications/unread-count";
    }

    UploadApi {
        fn delete(file_id: &str) -> Value = DELETE "upload/{}" [file_id];
    }
}

impl BoothApi {
    pub async fn assign(&self, id: &str, exhibitor_id: &str) -> AppResult<Booth> {
        let body = json!({ "exhibitorId": exhibitor_id });
        self.client.post(&format!("booths/{}/assign", seg(id)), &body).await
    }
}

impl FeedbackApi {
    pub async fn assign(&self, id: &str, user_id: &str) -> AppResult<Feedback> {
        let body = json!({ "userId": user_id });
        self.client.post(&format!("feedback/{}/assign", seg(id)), &body).await
    }

    pub async fn respond(&self, id: &str, response: &str) -> AppResult<Feedback> {
        let body = json!({ "response": response });
        self.client.post(&format!("feedback/{}/respond", seg(id)), &body).await
    }
}

impl AnalyticsApi {
    /// Downloads a report file; `kind` picks the report, `params` become the query string.
    pub async fn export_report<Q: Serialize + ?Sized>(&self, kind: &str, params: &Q) -> AppResult<Vec<u8>> {
        self.client.get_bytes(&format!("analytics/export/{}", seg(kind)), params).await
    }
}

pub const DEFAULT_UPLOAD_FOLDER: &str = "general";

impl UploadApi {
    /// Multipart upload with fields `file` and `folder`. `None` files into
    /// [`DEFAULT_UPLOAD_FOLDER`].
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>, folder: Option<&str>) -> AppResult<Value> {
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("folder", folder.unwrap_or(DEFAULT_UPLOAD_FOLDER).to_string());
        self.client.post_multipart("upload", form).await
    }
}

/// Every resource client over one shared [`ApiClient`].
#[derive(Clone)]
pub struct Api {
    pub auth: AuthApi,
    pub users: UserApi,
    pub expos: ExpoApi,
    pub booths: BoothApi,
    pub exhibitors: ExhibitorApi,
    pub attendees: AttendeeApi,
    pub schedule: ScheduleApi,
    pub feedback: FeedbackApi,
    pub messages: MessageApi,
    pub analytics: AnalyticsApi,
    pub notifications: NotificationApi,
    pub upload: UploadApi,
}

impl Api {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            auth: AuthApi::new(client.clone()),
            users: UserApi::new(client.clone()),
            expos: ExpoApi::new(client.clone()),
            booths: BoothApi::new(client.clone()),
            exhibitors: ExhibitorApi::new(client.clone()),
            attendees: AttendeeApi::new(client.clone()),
            schedule: ScheduleApi::new(client.clone()),
            feedback: FeedbackApi::new(client.clone()),
            messages: MessageApi::new(client.clone()),
            analytics: AnalyticsApi::new(client.clone()),
            notifications: NotificationApi::new(client.clone()),
            upload: UploadApi::new(client),
        }
    }
}
