//! Create activity table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activity::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Activity::ActorId).big_integer().not_null())
                    .col(ColumnDef::new(Activity::ActivityType).string_len(32).not_null())
                    .col(ColumnDef::new(Activity::RecipeId).big_integer().not_null())
                    .col(ColumnDef::new(Activity::CommentId).big_integer())
                    .col(ColumnDef::new(Activity::LikeId).big_integer())
                    .col(ColumnDef::new(Activity::BookmarkId).big_integer())
                    .col(
                        ColumnDef::new(Activity::Weight)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Activity::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_actor")
                            .from(Activity::Table, Activity::ActorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_recipe")
                            .from(Activity::Table, Activity::RecipeId)
                            .to(Recipe::Table, Recipe::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_comment")
                            .from(Activity::Table, Activity::CommentId)
                            .to(Comment::Table, Comment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_like")
                            .from(Activity::Table, Activity::LikeId)
                            .to(RecipeLike::Table, RecipeLike::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_bookmark")
                            .from(Activity::Table, Activity::BookmarkId)
                            .to(Bookmark::Table, Bookmark::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (actor_id, created_at) for feed reads
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_actor_created")
                    .table(Activity::Table)
                    .col(Activity::ActorId)
                    .col(Activity::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_created_at")
                    .table(Activity::Table)
                    .col(Activity::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Activity {
    Table,
    Id,
    ActorId,
    ActivityType,
    RecipeId,
    CommentId,
    LikeId,
    BookmarkId,
    Weight,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Recipe {
    Table,
    Id,
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
}

#[derive(Iden)]
enum RecipeLike {
    Table,
    Id,
}

#[derive(Iden)]
enum Bookmark {
    Table,
    Id,
}
