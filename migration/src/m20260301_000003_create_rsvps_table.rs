use sea_orm_migration::prelude::*;

/// Creates the `rsvps` join table with a composite unique constraint on
/// (`user_id`, `game_id`).
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Rsvps {
    Table,
    Id,
    UserId,
    GameId,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Games {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rsvps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rsvps::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rsvps::UserId).integer().not_null())
                    .col(ColumnDef::new(Rsvps::GameId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rsvps_user_id")
                            .from(Rsvps::Table, Rsvps::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rsvps_game_id")
                            .from(Rsvps::Table, Rsvps::GameId)
                            .to(Games::Table, Games::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one RSVP per user per game
        manager
            .create_index(
                Index::create()
                    .name("idx_rsvps_user_game")
                    .table(Rsvps::Table)
                    .col(Rsvps::UserId)
                    .col(Rsvps::GameId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rsvps::Table).to_owned())
            .await
    }
}
