use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(pk_auto(Movies::Id))
                    .col(string(Movies::Name))
                    .col(string_uniq(Movies::Slug))
                    .col(string_null(Movies::OriginName))
                    .col(text_null(Movies::Content))
                    .col(string_null(Movies::PosterUrl))
                    .col(string_null(Movies::ThumbUrl))
                    .col(string_null(Movies::TrailerUrl))
                    .col(string_null(Movies::Time))
                    .col(string_null(Movies::EpisodeCurrent))
                    .col(string_null(Movies::EpisodeTotal))
                    .col(string_null(Movies::Quality))
                    .col(string_null(Movies::Lang))
                    .col(integer_null(Movies::Year))
                    .col(string_null(Movies::Status))
                    .col(big_integer(Movies::View).default(0))
                    .col(text(Movies::Actors).default("[]"))
                    .col(text(Movies::Directors).default("[]"))
                    .col(integer_null(Movies::TypeId))
                    .col(text_null(Movies::Embedding))
                    .col(big_integer(Movies::CreatedAt))
                    .col(big_integer(Movies::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movies_type_id")
                            .from(Movies::Table, Movies::TypeId)
                            .to(MovieTypes::Table, MovieTypes::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_type_id")
                    .table(Movies::Table)
                    .col(Movies::TypeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieGenres::Table)
                    .if_not_exists()
                    .col(integer(MovieGenres::MovieId))
                    .col(integer(MovieGenres::GenreId))
                    .primary_key(Index::create().col(MovieGenres::MovieId).col(MovieGenres::GenreId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genres_movie_id")
                            .from(MovieGenres::Table, MovieGenres::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genres_genre_id")
                            .from(MovieGenres::Table, MovieGenres::GenreId)
                            .to(Genres::Table, Genres::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieCountries::Table)
                    .if_not_exists()
                    .col(integer(MovieCountries::MovieId))
                    .col(integer(MovieCountries::CountryId))
                    .primary_key(
                        Index::create().col(MovieCountries::MovieId).col(MovieCountries::CountryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_countries_movie_id")
                            .from(MovieCountries::Table, MovieCountries::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_countries_country_id")
                            .from(MovieCountries::Table, MovieCountries::CountryId)
                            .to(Countries::Table, Countries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Episodes::Table)
                    .if_not_exists()
                    .col(pk_auto(Episodes::Id))
                    .col(integer(Episodes::MovieId))
                    .col(string(Episodes::Name))
                    .col(string(Episodes::Slug))
                    .col(big_integer(Episodes::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_episodes_movie_id")
                            .from(Episodes::Table, Episodes::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_episodes_movie_slug")
                    .table(Episodes::Table)
                    .col(Episodes::MovieId)
                    .col(Episodes::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_episodes_created_at")
                    .table(Episodes::Table)
                    .col(Episodes::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EpisodeServers::Table)
                    .if_not_exists()
                    .col(pk_auto(EpisodeServers::Id))
                    .col(integer(EpisodeServers::EpisodeId))
                    .col(string(EpisodeServers::ServerName))
                    .col(string_null(EpisodeServers::Filename))
                    .col(string_null(EpisodeServers::LinkEmbed))
                    .col(string_null(EpisodeServers::LinkM3u8))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_episode_servers_episode_id")
                            .from(EpisodeServers::Table, EpisodeServers::EpisodeId)
                            .to(Episodes::Table, Episodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(EpisodeServers::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Episodes::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieCountries::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieGenres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Name,
    Slug,
    OriginName,
    Content,
    PosterUrl,
    ThumbUrl,
    TrailerUrl,
    Time,
    EpisodeCurrent,
    EpisodeTotal,
    Quality,
    Lang,
    Year,
    Status,
    View,
    Actors,
    Directors,
    TypeId,
    Embedding,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum MovieTypes {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Genres {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Countries {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum MovieGenres {
    Table,
    MovieId,
    GenreId,
}

#[derive(DeriveIden)]
enum MovieCountries {
    Table,
    MovieId,
    CountryId,
}

#[derive(DeriveIden)]
enum Episodes {
    Table,
    Id,
    MovieId,
    Name,
    Slug,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EpisodeServers {
    Table,
    Id,
    EpisodeId,
    ServerName,
    Filename,
    LinkEmbed,
    #[sea_orm(iden = "link_m3u8")]
    LinkM3u8,
}
