//! services/api/src/adapters/demo_auth.rs
//!
//! The local demo login. There is no account backend: two well-known roll
//! numbers sign in as the sample student, everything else is rejected.

use async_trait::async_trait;
use campus_core::domain::{EmergencyContact, User};
use campus_core::ports::{AuthProvider, PortError, PortResult};
use chrono::{TimeZone, Utc};

const DEMO_ROLL_NUMBER: &str = "AUP23CSE001";

#[derive(Debug, Default, Clone, Copy)]
pub struct DemoAuthProvider;

impl DemoAuthProvider {
    fn demo_user(roll_number: String) -> User {
        User {
            id: "user_123".to_string(),
            name: "Arjun Sharma".to_string(),
            roll_number,
            email: "arjun.sharma@s.amity.edu".to_string(),
            course: "B.Tech".to_string(),
            branch: "Computer Science Engineering".to_string(),
            semester: 6,
            year: 3,
            profile_photo: None,
            phone: Some("+91 9876543210".to_string()),
            address: Some("Amity University Punjab, Mohali".to_string()),
            emergency_contact: Some(EmergencyContact {
                name: "Rajesh Sharma".to_string(),
                phone: "+91 9876543211".to_string(),
                relationship: "Father".to_string(),
            }),
            joined_at: Utc.with_ymd_and_hms(2021, 8, 15, 0, 0, 0).single().unwrap_or_default(),
            last_login: None,
        }
    }
}

#[async_trait]
impl AuthProvider for DemoAuthProvider {
    async fn authenticate(&self, roll_number: &str, password: &str) -> PortResult<User> {
        let roll_number = roll_number.trim();
        if roll_number.is_empty() || password.trim().is_empty() {
            return Err(PortError::Unauthorized(
                "roll number and password are required".to_string(),
            ));
        }

        if roll_number.eq_ignore_ascii_case("demo") {
            Ok(Self::demo_user(DEMO_ROLL_NUMBER.to_string()))
        } else if roll_number == "12345" {
            Ok(Self::demo_user(roll_number.to_string()))
        } else {
            Err(PortError::Unauthorized(
                "invalid roll number or password".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_roll_number_signs_in_sample_student() {
        let user = DemoAuthProvider.authenticate("DeMo", "anything").await.unwrap();
        assert_eq!(user.roll_number, DEMO_ROLL_NUMBER);
        assert_eq!(user.id, "user_123");
        assert!(user.last_login.is_none());
    }

    #[tokio::test]
    async fn numeric_demo_keeps_entered_roll_number() {
        let user = DemoAuthProvider.authenticate("12345", "pw").await.unwrap();
        assert_eq!(user.roll_number, "12345");
    }

    #[tokio::test]
    async fn unknown_or_blank_credentials_are_rejected() {
        for (roll, password) in [("AUP99", "pw"), ("demo", " "), ("", "pw")] {
            assert!(matches!(
                DemoAuthProvider.authenticate(roll, password).await,
                Err(PortError::Unauthorized(_))
            ));
        }
    }
}
