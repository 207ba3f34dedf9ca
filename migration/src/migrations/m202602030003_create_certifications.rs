use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202602030003_create_certifications"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("certifications"))
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
                    .col(ColumnDef::new(Alias::new("exam_attempt_id")).big_integer().not_null())
                    .col(
                        ColumnDef::new(Alias::new("cert_number"))
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Alias::new("score")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("total")).integer().not_null())
                    .col(
                        ColumnDef::new(Alias::new("mention"))
                            .enumeration(
                                Alias::new("mention_type"),
                                vec![
                                    Alias::new("bien"),
                                    Alias::new("tres_bien"),
                                    Alias::new("exceptionnelle"),
                                ],
                            )
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("verification_path"))
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("certified_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certifications_user_id")
                            .from(Alias::new("certifications"), Alias::new("user_id"))
                            .to(Alias::new("profiles"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certifications_technology_id")
                            .from(Alias::new("certifications"), Alias::new("technology_id"))
                            .to(Alias::new("technologies"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certifications_exam_attempt_id")
                            .from(Alias::new("certifications"), Alias::new("exam_attempt_id"))
                            .to(Alias::new("exam_attempts"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_certifications_user_technology")
                            .col(Alias::new("user_id"))
                            .col(Alias::new("technology_id"))
                            .unique(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("certifications")).to_owned())
            .await
    }
}
