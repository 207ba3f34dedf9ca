use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202602030002_create_exam_attempt_questions"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("exam_attempt_questions"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("attempt_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("position")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("chapter_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("chapter_title")).string().not_null())
                    .col(ColumnDef::new(Alias::new("question")).text().not_null())
                    .col(ColumnDef::new(Alias::new("options")).json().not_null())
                    .col(ColumnDef::new(Alias::new("correct_index")).integer().not_null())
                    .col(
                        ColumnDef::new(Alias::new("explanation"))
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exam_attempt_questions_attempt_id")
                            .from(Alias::new("exam_attempt_questions"), Alias::new("attempt_id"))
                            .to(Alias::new("exam_attempts"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_exam_attempt_questions_attempt_position")
                            .col(Alias::new("attempt_id"))
                            .col(Alias::new("position"))
                            .unique(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Alias::new("exam_attempt_questions"))
                    .to_owned(),
            )
            .await
    }
}
