use crate::seed::Seeder;
use db::models::{chapter, quiz_question, technology};
use fake::{Fake, faker::lorem::en::{Sentence, Word}};
use sea_orm::{DatabaseConnection, DbErr};

const TECHNOLOGIES: &[(&str, &str, &[&str])] = &[
    ("rust", "Rust", &["Ownership", "Traits", "Error handling", "Async"]),
    ("typescript", "TypeScript", &["Types", "Generics", "Modules", "Tooling"]),
    ("sql", "SQL", &["Select", "Joins", "Indexes", "Transactions"]),
];

const QUESTIONS_PER_CHAPTER: i32 = 5;

pub struct TechnologySeeder;

#[async_trait::async_trait]
impl Seeder for TechnologySeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        for (order, &(slug, name, chapters)) in TECHNOLOGIES.iter().enumerate() {
            if technology::Model::find_by_slug(db, slug).await?.is_some() {
                continue;
            }
            let tech = technology::Model::create(db, slug, name, order as i32).await?;

            for (index, &title) in chapters.iter().enumerate() {
                let ch = chapter::Model::create(db, tech.id, title, index as i32).await?;

                for position in 0..QUESTIONS_PER_CHAPTER {
                    let sentence: String = Sentence(4..9).fake();
                    let question = format!("{title}: {}?", sentence.trim_end_matches('.'));
                    let options: Vec<String> = (0..4).map(|_| Word().fake()).collect();
                    let correct_index = fastrand::i32(0..4);
                    let explanation: String = Sentence(6..12).fake();

                    quiz_question::Model::create(
                        db,
                        ch.id,
                        position,
                        &question,
                        &options,
                        correct_index,
                        &explanation,
                    )
                    .await?;
                }
            }
        }
        Ok(())
    }
}
