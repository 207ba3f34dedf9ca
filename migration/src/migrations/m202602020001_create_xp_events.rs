use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202602020001_create_xp_events"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("xp_events"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("user_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("amount")).big_integer().not_null())
                    .col(
                        ColumnDef::new(Alias::new("source"))
                            .enumeration(
                                Alias::new("xp_source_type"),
                                vec![
                                    Alias::new("course"),
                                    Alias::new("quiz"),
                                    Alias::new("badge"),
                                    Alias::new("streak"),
                                    Alias::new("challenge"),
                                    Alias::new("certification"),
                                ],
                            )
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("source_ref")).string().null())
                    .col(ColumnDef::new(Alias::new("idempotency_key")).string().null())
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_xp_events_user_id")
                            .from(Alias::new("xp_events"), Alias::new("user_id"))
                            .to(Alias::new("profiles"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_xp_events_user_idempotency_key")
                            .col(Alias::new("user_id"))
                            .col(Alias::new("idempotency_key"))
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_xp_events_user_created_at")
                    .table(Alias::new("xp_events"))
                    .col(Alias::new("user_id"))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("xp_events")).to_owned())
            .await
    }
}
