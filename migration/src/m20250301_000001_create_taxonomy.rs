use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MovieTypes::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieTypes::Id))
                    .col(string(MovieTypes::Name))
                    .col(string_uniq(MovieTypes::Slug))
                    .col(big_integer(MovieTypes::CreatedAt))
                    .col(big_integer(MovieTypes::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(pk_auto(Genres::Id))
                    .col(string(Genres::Name))
                    .col(string_uniq(Genres::Slug))
                    .col(big_integer(Genres::CreatedAt))
                    .col(big_integer(Genres::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Countries::Table)
                    .if_not_exists()
                    .col(pk_auto(Countries::Id))
                    .col(string(Countries::Name))
                    .col(string_uniq(Countries::Slug))
                    .col(big_integer(Countries::CreatedAt))
                    .col(big_integer(Countries::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Countries::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieTypes::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum MovieTypes {
    Table,
    Id,
    Name,
    Slug,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Genres {
    Table,
    Id,
    Name,
    Slug,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Countries {
    Table,
    Id,
    Name,
    Slug,
    CreatedAt,
    UpdatedAt,
}
