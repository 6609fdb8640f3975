//! Data each page shows, fetched through the resource clients.

use futures_util::future::try_join_all;
use serde::Serialize;
use serde_json::Value;

use crate::api::models::{Expo, ExpoQuery};
use crate::api::Api;
use crate::error::AppResult;
use crate::identity::Session;
use crate::routing::Page;

#[derive(Debug, Clone, PartialEq)]
pub enum PageContent {
    /// Nothing to fetch: the page is a form.
    Form,
    Record(Value),
    Table(Vec<Value>),
}

impl PageContent {
    pub fn as_json(&self) -> Value {
        match self {
            PageContent::Form => Value::Null,
            PageContent::Record(v) => v.clone(),
            PageContent::Table(rows) => Value::Array(rows.clone()),
        }
    }
}

fn table<T: Serialize>(rows: Vec<T>) -> AppResult<PageContent> {
    let rows = rows.into_iter().map(serde_json::to_value).collect::<Result<Vec<_>, _>>()?;
    Ok(PageContent::Table(rows))
}

fn record<T: Serialize>(value: T) -> AppResult<PageContent> { Ok(PageContent::Record(serde_json::to_value(value)?)) }

/// Run `per_expo` for every expo in `expos` concurrently and flatten the results.
async fn across_expos<T, F, Fut>(expos: Vec<Expo>, per_expo: F) -> AppResult<PageContent>
where
    T: Serialize,
    F: Fn(String) -> Fut,
    Fut: std::future::Future<Output = AppResult<Vec<T>>>,
{
    let batches = try_join_all(expos.into_iter().map(|e| per_expo(e.id))).await?;
    table(batches.into_iter().flatten().collect())
}

pub async fn load(api: &Api, session: &Session, page: &Page) -> AppResult<PageContent> {
    match page {
        Page::Home => table(api.expos.public().await?),
        Page::Expos | Page::ExpoManagement => table(api.expos.list(&ExpoQuery::default()).await?),
        Page::ExpoDetail { id } => record(api.expos.get(id).await?),
        Page::Login | Page::Register | Page::ForgotPassword | Page::ResetPassword { .. } | Page::CreateExpo => {
            Ok(PageContent::Form)
        }
        Page::DashboardHome => record(api.analytics.dashboard().await?),
        Page::UserManagement => table(api.users.list().await?),
        Page::Analytics => record(api.analytics.revenue().await?),
        Page::MyExpos => table(api.expos.my().await?),
        Page::ExhibitorApplications => {
            let mine = api.expos.my().await?;
            across_expos(mine, |id| async move { api.exhibitors.applications(&id).await }).await
        }
        Page::Attendees => {
            let mine = api.expos.my().await?;
            across_expos(mine, |id| async move { api.attendees.list(&id).await }).await
        }
        Page::BoothManagement => {
            let mine = api.expos.my().await?;
            across_expos(mine, |id| async move { api.booths.list(&id).await }).await
        }
        Page::Schedule => {
            let mine = api.expos.my().await?;
            across_expos(mine, |id| async move { api.schedule.list(&id).await }).await
        }
        Page::CompanyProfile | Page::MyApplications => table(api.exhibitors.my().await?),
        Page::MyBooth => table(api.booths.my().await?),
        Page::ExhibitorAnalytics => match &session.user {
            Some(u) => record(api.analytics.exhibitor(&u.id).await?),
            None => Ok(PageContent::Record(Value::Null)),
        },
        Page::AttendeeProfile | Page::Profile => record(&session.user),
        Page::Registrations => table(api.attendees.my_registrations().await?),
        Page::Sessions => table(api.schedule.my_bookings().await?),
        Page::ExhibitorDirectory => {
            let public = api.expos.public().await?;
            across_expos(public, |id| async move { api.exhibitors.list(&id).await }).await
        }
        Page::Networking => record(api.attendees.networking().await?),
        Page::Feedback => table(api.feedback.list().await?),
        Page::Messages => table(api.messages.list().await?),
        Page::Notifications => table(api.notifications.list().await?),
    }
}
