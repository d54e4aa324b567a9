//! Activity entity.
//!
//! One row per user action worth surfacing to followers. The sub-entity
//! columns point at the comment, like, or bookmark that produced the row and
//! cascade on delete, so retracting the action removes the activity too.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of action recorded in the activity log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "bookmark")]
    Bookmark,
    #[sea_orm(string_value = "new_recipe")]
    NewRecipe,
}

impl ActivityType {
    /// Wire name of this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Bookmark => "bookmark",
            Self::NewRecipe => "new_recipe",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The user who performed the action
    pub actor_id: i64,

    pub activity_type: ActivityType,

    /// The recipe the action concerns
    pub recipe_id: i64,

    #[sea_orm(nullable)]
    pub comment_id: Option<i64>,

    #[sea_orm(nullable)]
    pub like_id: Option<i64>,

    #[sea_orm(nullable)]
    pub bookmark_id: Option<i64>,

    /// Ranking weight
    #[sea_orm(default_value = 1)]
    pub weight: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ActorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Actor,

    #[sea_orm(
        belongs_to = "super::recipe::Entity",
        from = "Column::RecipeId",
        to = "super::recipe::Column::Id",
        on_delete = "Cascade"
    )]
    Recipe,

    #[sea_orm(
        belongs_to = "super::comment::Entity",
        from = "Column::CommentId",
        to = "super::comment::Column::Id",
        on_delete = "Cascade"
    )]
    Comment,

    #[sea_orm(
        belongs_to = "super::recipe_like::Entity",
        from = "Column::LikeId",
        to = "super::recipe_like::Column::Id",
        on_delete = "Cascade"
    )]
    Like,

    #[sea_orm(
        belongs_to = "super::bookmark::Entity",
        from = "Column::BookmarkId",
        to = "super::bookmark::Column::Id",
        on_delete = "Cascade"
    )]
    Bookmark,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actor.def()
    }
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
