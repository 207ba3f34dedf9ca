use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202602030001_create_exam_attempts"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("exam_attempts"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("user_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("technology_id")).big_integer().not_null())
                    .col(
                        ColumnDef::new(Alias::new("score"))
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Alias::new("total")).integer().not_null())
                    .col(
                        ColumnDef::new(Alias::new("passed"))
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Alias::new("status"))
                            .enumeration(
                                Alias::new("exam_status_type"),
                                vec![
                                    Alias::new("in_progress"),
                                    Alias::new("graded"),
                                    Alias::new("expired"),
                                ],
                            )
                            .not_null()
                            .default("in_progress"),
                    )
                    .col(ColumnDef::new(Alias::new("started_at")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("completed_at")).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exam_attempts_user_id")
                            .from(Alias::new("exam_attempts"), Alias::new("user_id"))
                            .to(Alias::new("profiles"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exam_attempts_technology_id")
                            .from(Alias::new("exam_attempts"), Alias::new("technology_id"))
                            .to(Alias::new("technologies"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_exam_attempts_user_technology")
                    .table(Alias::new("exam_attempts"))
                    .col(Alias::new("user_id"))
                    .col(Alias::new("technology_id"))
                    .col(Alias::new("started_at"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("exam_attempts")).to_owned())
            .await
    }
}
