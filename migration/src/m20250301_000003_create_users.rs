use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_uniq(Users::FirebaseUid))
                    .col(string_null(Users::Email))
                    .col(string_null(Users::Name))
                    .col(string_null(Users::Avatar))
                    .col(string(Users::Role).default("USER"))
                    .col(big_integer(Users::CreatedAt))
                    .col(big_integer(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(string(Sessions::Token).primary_key())
                    .col(integer(Sessions::UserId))
                    .col(big_integer(Sessions::ExpiresAt))
                    .col(big_integer(Sessions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_user_id")
                            .from(Sessions::Table, Sessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserInteractions::Table)
                    .if_not_exists()
                    .col(pk_auto(UserInteractions::Id))
                    .col(integer(UserInteractions::UserId))
                    .col(integer(UserInteractions::MovieId))
                    .col(string(UserInteractions::Kind))
                    .col(big_integer(UserInteractions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_interactions_user_id")
                            .from(UserInteractions::Table, UserInteractions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_interactions_movie_id")
                            .from(UserInteractions::Table, UserInteractions::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_interactions_unique")
                    .table(UserInteractions::Table)
                    .col(UserInteractions::UserId)
                    .col(UserInteractions::MovieId)
                    .col(UserInteractions::Kind)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WatchHistories::Table)
                    .if_not_exists()
                    .col(pk_auto(WatchHistories::Id))
                    .col(integer(WatchHistories::UserId))
                    .col(integer(WatchHistories::MovieId))
                    .col(integer_null(WatchHistories::EpisodeId))
                    .col(integer(WatchHistories::Progress).default(0))
                    .col(integer_null(WatchHistories::Duration))
                    .col(big_integer(WatchHistories::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watch_histories_user_id")
                            .from(WatchHistories::Table, WatchHistories::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watch_histories_movie_id")
                            .from(WatchHistories::Table, WatchHistories::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watch_histories_episode_id")
                            .from(WatchHistories::Table, WatchHistories::EpisodeId)
                            .to(Episodes::Table, Episodes::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_watch_histories_user_movie")
                    .table(WatchHistories::Table)
                    .col(WatchHistories::UserId)
                    .col(WatchHistories::MovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(WatchHistories::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(UserInteractions::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Sessions::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    FirebaseUid,
    Email,
    Name,
    Avatar,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Token,
    UserId,
    ExpiresAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserInteractions {
    Table,
    Id,
    UserId,
    MovieId,
    Kind,
    CreatedAt,
}

#[derive(DeriveIden)]
enum WatchHistories {
    Table,
    Id,
    UserId,
    MovieId,
    EpisodeId,
    Progress,
    Duration,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Episodes {
    Table,
    Id,
}
