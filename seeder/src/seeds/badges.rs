use crate::seed::Seeder;
use db::models::badge::{BadgeRarity, Model, NewBadge};
use sea_orm::{DatabaseConnection, DbErr};

/// (slug, name, description, rarity, condition, threshold, xp reward)
const CATALOG: &[(&str, &str, &str, BadgeRarity, &str, i32, i32)] = &[
    ("first_course", "Premier pas", "Terminer un premier cours", BadgeRarity::Common, "courses_completed", 1, 25),
    ("ten_courses", "Assidu", "Terminer 10 cours", BadgeRarity::Rare, "courses_completed", 10, 100),
    ("fifty_courses", "Bibliothèque vivante", "Terminer 50 cours", BadgeRarity::Epic, "courses_completed", 50, 300),
    ("first_quiz", "Premier quiz", "Terminer un premier quiz", BadgeRarity::Common, "quizzes_completed", 1, 25),
    ("twenty_quizzes", "Quizzeur", "Terminer 20 quiz", BadgeRarity::Rare, "quizzes_completed", 20, 100),
    ("first_perfect", "Sans faute", "Obtenir un score parfait", BadgeRarity::Common, "perfect_quizzes", 1, 50),
    ("six_perfects", "Perfectionniste", "Obtenir 6 scores parfaits", BadgeRarity::Rare, "perfect_quizzes", 6, 150),
    ("streak_3", "Lancé", "Apprendre 3 jours d'affilée", BadgeRarity::Common, "streak_days", 3, 0),
    ("streak_7", "Semaine de feu", "Apprendre 7 jours d'affilée", BadgeRarity::Rare, "streak_days", 7, 50),
    ("streak_30", "Inarrêtable", "Apprendre 30 jours d'affilée", BadgeRarity::Epic, "streak_days", 30, 200),
    ("streak_100", "Centurion", "Apprendre 100 jours d'affilée", BadgeRarity::Legendary, "streak_days", 100, 500),
    ("explorer", "Explorateur", "Commencer 3 technologies", BadgeRarity::Rare, "technologies_started", 3, 75),
    ("polyglot", "Polyglotte", "Commencer toutes les technologies", BadgeRarity::Legendary, "all_technologies", 1, 400),
    ("level_5", "Confirmé", "Atteindre le niveau 5", BadgeRarity::Rare, "level_reached", 5, 0),
    ("level_10", "Légende", "Atteindre le niveau 10", BadgeRarity::Legendary, "level_reached", 10, 0),
    ("night_owl", "Oiseau de nuit", "Apprendre entre minuit et 5 h", BadgeRarity::Rare, "night_study", 1, 50),
    ("comeback", "Le retour", "Revenir après 7 jours d'absence", BadgeRarity::Common, "comeback_days", 7, 30),
    ("all_courses_techno", "Tour complet", "Terminer tous les cours d'une technologie", BadgeRarity::Epic, "techno_courses_complete", 1, 200),
    ("techno_perfect", "Maîtrise totale", "Score parfait à tous les quiz d'une technologie", BadgeRarity::Legendary, "techno_all_perfect", 1, 500),
    ("marathon", "Marathon", "Terminer 5 cours dans la même journée", BadgeRarity::Epic, "daily_courses", 5, 150),
    ("redemption", "Rédemption", "Score parfait après plusieurs échecs", BadgeRarity::Rare, "redemption_perfect", 1, 75),
    ("early_adopter", "Pionnier", "Faire partie des 100 premiers inscrits", BadgeRarity::Epic, "early_adopter", 100, 100),
    ("speed_demon", "Éclair", "Score parfait en moins d'une minute", BadgeRarity::Rare, "speed_perfect", 1, 75),
    ("ambassador", "Ambassadeur", "Parrainer 3 personnes", BadgeRarity::Epic, "referrals", 3, 150),
];

pub struct BadgeSeeder;

#[async_trait::async_trait]
impl Seeder for BadgeSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        for &(slug, name, description, rarity, condition_type, condition_value, xp_reward) in CATALOG {
            if Model::find_by_slug(db, slug).await?.is_some() {
                continue;
            }
            Model::create(
                db,
                NewBadge {
                    slug,
                    name,
                    description,
                    rarity,
                    condition_type,
                    condition_value,
                    xp_reward,
                },
            )
            .await?;
        }
        Ok(())
    }
}
