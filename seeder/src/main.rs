use crate::seed::{Seeder, run_seeder};
use crate::seeds::{
    badges::BadgeSeeder, challenges::ChallengeSeeder, profiles::ProfileSeeder,
    technologies::TechnologySeeder,
};
use util::config;
use util::logging::init_logging;

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    let _guard = init_logging(
        &config::log_file(),
        &config::log_level(),
        config::log_to_stdout(),
    );

    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to connect to {}: {e}", config::database_path());
            std::process::exit(1);
        }
    };

    for (seeder, name) in [
        (Box::new(BadgeSeeder) as Box<dyn Seeder + Send + Sync>, "Badge"),
        (Box::new(TechnologySeeder), "Technology"),
        (Box::new(ChallengeSeeder), "Challenge"),
        (Box::new(ProfileSeeder), "Profile"),
    ] {
        run_seeder(&*seeder, name, &db).await;
    }
}
