use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub origin_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub poster_url: Option<String>,
    pub thumb_url: Option<String>,
    pub trailer_url: Option<String>,
    pub time: Option<String>,
    pub episode_current: Option<String>,
    pub episode_total: Option<String>,
    pub quality: Option<String>,
    pub lang: Option<String>,
    pub year: Option<i32>,
    pub status: Option<String>,
    pub view: i64,
    /// JSON array of names.
    #[sea_orm(column_type = "Text")]
    pub actors: String,
    /// JSON array of names.
    #[sea_orm(column_type = "Text")]
    pub directors: String,
    pub type_id: Option<i32>,
    /// JSON array of `f32`, absent until an embedding has been stored.
    #[sea_orm(column_type = "Text", nullable)]
    pub embedding: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::movie_type::Entity",
        from = "Column::TypeId",
        to = "super::movie_type::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    MovieType,
    #[sea_orm(has_many = "super::episode::Entity")]
    Episode,
    #[sea_orm(has_many = "super::movie_genre::Entity")]
    MovieGenre,
    #[sea_orm(has_many = "super::movie_country::Entity")]
    MovieCountry,
    #[sea_orm(has_many = "super::watch_history::Entity")]
    WatchHistory,
}

impl Related<super::movie_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieType.def()
    }
}

impl Related<super::episode::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Episode.def()
    }
}

impl Related<super::movie_genre::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieGenre.def()
    }
}

impl Related<super::movie_country::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieCountry.def()
    }
}

impl Related<super::watch_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WatchHistory.def()
    }
}

impl Related<super::genre::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_genre::Relation::Genre.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_genre::Relation::Movie.def().rev())
    }
}

impl Related<super::country::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_country::Relation::Country.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_country::Relation::Movie.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
