//! Activity feed service.

use chrono::{DateTime, FixedOffset};
use recipebox_common::AppResult;
use recipebox_db::{
    entities::activity::ActivityType,
    repositories::{ActivityRepository, FeedCursor, FeedRow, FollowingRepository},
};
use serde::Serialize;

/// Maximum (and default) number of entries per feed page.
pub const FEED_PAGE_SIZE: u64 = 20;

/// Who performed a feed activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedActor {
    /// Actor's user ID.
    pub user_id: i64,
    /// Display name.
    pub name: String,
    /// Avatar image, if the user set one.
    pub avatar_url: Option<String>,
}

/// Recipe a feed activity concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecipe {
    /// Recipe ID.
    pub recipe_id: i64,
    /// Recipe title.
    pub title: String,
    /// Absolute link to the recipe on this server.
    pub url: String,
    /// Cover image, if any.
    pub image_url: Option<String>,
}

/// Comment attached to a `comment` activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedComment {
    /// Comment ID.
    pub comment_id: i64,
    /// Comment body.
    pub text: String,
}

/// One hydrated feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    /// Activity ID.
    pub id: i64,
    /// What happened.
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// When the activity was recorded.
    pub created_at: DateTime<FixedOffset>,
    /// Ranking weight stored with the activity.
    pub weight: i32,
    /// Who did it.
    pub actor: FeedActor,
    /// Which recipe it concerns.
    pub recipe: FeedRecipe,
    /// Set for `comment` activities whose comment still exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<FeedComment>,
    /// Set for `like` activities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_id: Option<i64>,
    /// Set for `bookmark` activities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark_id: Option<i64>,
}

/// A page of the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    /// Entries, newest first.
    pub entries: Vec<FeedEntry>,
    /// Present only when the page is full.
    pub next_cursor: Option<String>,
}

/// Feed service for business logic.
#[derive(Clone)]
pub struct FeedService {
    following_repo: FollowingRepository,
    activity_repo: ActivityRepository,
    server_url: String,
}

impl FeedService {
    /// Create a new feed service.
    ///
    /// `server_url` is the public base URL used to build recipe links.
    #[must_use]
    pub fn new(
        following_repo: FollowingRepository,
        activity_repo: ActivityRepository,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            following_repo,
            activity_repo,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Recent activity of the users `viewer_id` follows, newest first.
    ///
    /// `limit` defaults to and is clamped at [`FEED_PAGE_SIZE`]. `cursor` is
    /// the `next_cursor` of the previous page.
    pub async fn get_feed(
        &self,
        viewer_id: i64,
        limit: Option<u64>,
        cursor: Option<&str>,
    ) -> AppResult<FeedPage> {
        let limit = limit.unwrap_or(FEED_PAGE_SIZE).clamp(1, FEED_PAGE_SIZE);
        let cursor = cursor.map(str::parse::<FeedCursor>).transpose()?;

        let followee_ids = self.following_repo.find_followee_ids(viewer_id).await?;
        if followee_ids.is_empty() {
            return Ok(FeedPage::default());
        }

        let rows = self
            .activity_repo
            .find_feed(&followee_ids, limit, cursor)
            .await?;

        let next_cursor = if rows.len() as u64 == limit {
            rows.last().map(|row| row.cursor().to_string())
        } else {
            None
        };

        let entries = rows.into_iter().map(|row| self.hydrate(row)).collect();

        Ok(FeedPage {
            entries,
            next_cursor,
        })
    }

    fn hydrate(&self, row: FeedRow) -> FeedEntry {
        let comment = match (row.comment_id, row.comment_text) {
            (Some(comment_id), Some(text)) => Some(FeedComment { comment_id, text }),
            _ => None,
        };

        FeedEntry {
            id: row.id,
            activity_type: row.activity_type,
            created_at: row.created_at,
            weight: row.weight,
            actor: FeedActor {
                user_id: row.actor_id,
                name: row.actor_name,
                avatar_url: row.actor_avatar_url,
            },
            recipe: FeedRecipe {
                recipe_id: row.recipe_id,
                title: row.recipe_title,
                url: format!("{}/recipes/{}", self.server_url, row.recipe_id),
                image_url: row.recipe_image_url,
            },
            comment,
            like_id: row.like_id,
            bookmark_id: row.bookmark_id,
        }
    }
}
