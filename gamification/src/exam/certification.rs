//! Certificate numbers and issuance.

use chrono::{DateTime, Datelike, Utc};
use db::models::certification::{self, Mention, NewCertification};
use rand::Rng;
use sea_orm::ConnectionTrait;
use tracing::{info, warn};

use crate::error::{GamificationError, GamificationResult, is_unique_violation};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 4;
/// Candidate numbers tried before giving up.
pub const MAX_NUMBER_TRIES: usize = 32;

/// `CERT-<year>-<4 alphanumerics>`.
pub fn generate_cert_number<R: Rng + ?Sized>(year: i32, rng: &mut R) -> String {
    let code: String = (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("CERT-{year}-{code}")
}

/// Site-relative path of the public verification page.
pub fn verification_path(cert_number: &str) -> String {
    format!("/verify/{cert_number}")
}

/// What issuing a certification ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum Issuance {
    Issued(certification::Model),
    /// The user already held a certification for the technology.
    AlreadyCertified(certification::Model),
}

/// Details of the passing attempt a certification is issued for.
#[derive(Debug, Clone, Copy)]
pub struct PassingAttempt {
    pub user_id: i64,
    pub technology_id: i64,
    pub attempt_id: i64,
    pub score: i32,
    pub total: i32,
    pub mention: Mention,
}

/// Issues a certification unless the user already holds one for the technology.
///
/// The existing-certification check runs right before each insert. Losing a
/// race on the (user, technology) pair reports `AlreadyCertified`; a clash on
/// the certificate number draws a new one.
pub async fn issue<C, F>(
    db: &C,
    attempt: PassingAttempt,
    now: DateTime<Utc>,
    mut next_number: F,
) -> GamificationResult<Issuance>
where
    C: ConnectionTrait,
    F: FnMut(i32) -> String,
{
    for _ in 0..MAX_NUMBER_TRIES {
        if let Some(existing) = certification::Model::find_for_user_and_technology(
            db,
            attempt.user_id,
            attempt.technology_id,
        )
        .await?
        {
            return Ok(Issuance::AlreadyCertified(existing));
        }

        let cert_number = next_number(now.year());
        if certification::Model::find_by_cert_number(db, &cert_number).await?.is_some() {
            continue;
        }

        let new = NewCertification {
            user_id: attempt.user_id,
            technology_id: attempt.technology_id,
            exam_attempt_id: attempt.attempt_id,
            verification_path: verification_path(&cert_number),
            cert_number,
            score: attempt.score,
            total: attempt.total,
            mention: attempt.mention,
        };

        match certification::Model::create(db, new, now).await {
            Ok(cert) => {
                info!(
                    user_id = attempt.user_id,
                    technology_id = attempt.technology_id,
                    cert_number = %cert.cert_number,
                    mention = %cert.mention,
                    "Certification issued"
                );
                return Ok(Issuance::Issued(cert));
            }
            Err(e) if is_unique_violation(&e) => {
                warn!(user_id = attempt.user_id, "Certification insert conflicted; re-checking");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(GamificationError::CertificateNumberSpace(MAX_NUMBER_TRIES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_number_format() {
        let mut rng = StdRng::seed_from_u64(5);
        let number = generate_cert_number(2026, &mut rng);
        assert!(number.starts_with("CERT-2026-"));
        let code = &number["CERT-2026-".len()..];
        assert_eq!(code.len(), 4);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        assert_eq!(verification_path(&number), format!("/verify/{number}"));
    }
}
