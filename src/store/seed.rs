use chrono::Utc;

use crate::error::Result;
use crate::models::user::{User, UserRole};
use crate::models::vacancy::Vacancy;
use crate::store::{Account, DemoStore};
use crate::utils::crypto::hash_password;

pub const SEED_PASSWORD: &str = "password123";
pub const SEED_EMPLOYER_EMAIL: &str = "employer@test.com";
pub const SEED_SEEKER_EMAIL: &str = "seeker@test.com";

/// Demo accounts plus a few open vacancies owned by the employer.
pub async fn seed_test_data(store: &DemoStore) -> Result<()> {
    if store.account_by_email(SEED_EMPLOYER_EMAIL).await?.is_some() {
        return Ok(());
    }

    let employer = create_account(store, SEED_EMPLOYER_EMAIL, "John Employer", UserRole::Employer).await?;
    create_account(store, SEED_SEEKER_EMAIL, "Jane Seeker", UserRole::JobSeeker).await?;

    let vacancies = [
        (
            "Senior Frontend Developer",
            "TechCorp",
            "San Francisco, CA",
            (120_000.0, 180_000.0),
            "6_plus_years",
            true,
            "We are looking for an experienced frontend developer to join our team.",
            "5+ years of React experience, TypeScript, Next.js",
            "Build and maintain web applications, mentor junior developers",
        ),
        (
            "Backend Engineer",
            "TechCorp",
            "New York, NY",
            (100_000.0, 150_000.0),
            "3_6_years",
            false,
            "Join our backend team to build scalable APIs.",
            "3+ years of Rust or Python, PostgreSQL, Docker",
            "Design and implement REST APIs, optimize database queries",
        ),
        (
            "Junior Support Engineer",
            "TechCorp",
            "Remote",
            (45_000.0, 60_000.0),
            "no_experience",
            true,
            "Help customers get the most out of our platform.",
            "Communication skills, basic SQL, curiosity",
            "Answer tickets, reproduce bugs, write help articles",
        ),
    ];

    for (title, company, location, (min, max), level, remote, description, requirements, duties) in vacancies {
        store
            .vacancies
            .create(Vacancy {
                id: 0,
                title: title.to_string(),
                company: company.to_string(),
                location: location.to_string(),
                salary_min: Some(min),
                salary_max: Some(max),
                currency: Some("USD".to_string()),
                description: description.to_string(),
                requirements: requirements.to_string(),
                responsibilities: Some(duties.to_string()),
                benefits: None,
                employment_type: Some("full_time".to_string()),
                experience_level: Some(level.to_string()),
                remote_work: remote,
                is_active: true,
                created_at: Utc::now(),
                updated_at: None,
                employer_id: employer.user.id,
            })
            .await?;
    }

    tracing::info!("Seeded demo accounts and vacancies");
    Ok(())
}

async fn create_account(
    store: &DemoStore,
    email: &str,
    full_name: &str,
    role: UserRole,
) -> Result<Account> {
    store
        .accounts
        .create(Account {
            user: User {
                id: 0,
                email: email.to_string(),
                full_name: full_name.to_string(),
                phone: None,
                role,
                is_active: true,
                created_at: Some(Utc::now()),
                updated_at: None,
            },
            password_hash: hash_password(SEED_PASSWORD)?,
        })
        .await
}
