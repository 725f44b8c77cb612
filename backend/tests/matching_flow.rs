//! Matching, volunteering, donation, and fulfilment flows exercised end to
//! end over the in-memory adapters.

mod support;

use std::sync::Arc;

use chrono::{Duration, Utc};

use bloodconnect::domain::matching::LocationFilter;
use bloodconnect::domain::ports::{
    DonationsService, MatchingService, NewDonation, NewRequest, RequestsService, UsersService,
};
use bloodconnect::domain::{
    BloodType, DonationService, ErrorCode, Hospital, MatchService, MatchStatus, Patient,
    RequestService, RequestStatus, Urgency, User, UserService,
};

use support::{
    CANDIDATE_LIMIT, InMemoryDonations, InMemoryRequests, InMemoryUsers, RecordingMailer,
    StaticIdentityProvider,
};

fn donor(name: &str, blood_type: BloodType) -> User {
    let mut user = User::new(format!("sub|{name}"), format!("{name}@example.com"), name);
    user.blood_type = Some(blood_type);
    user.location.city = Some("Mumbai".into());
    user.location.state = Some("Maharashtra".into());
    user
}

fn requester() -> User {
    User::new("sub|riya", "riya@example.com", "Riya")
}

fn new_request(units_needed: u32) -> NewRequest {
    NewRequest {
        patient: Patient {
            name: "Patient".into(),
            blood_type: BloodType::APositive,
            age: Some(40),
            gender: None,
        },
        hospital: Hospital {
            name: "City Hospital".into(),
            city: Some("Mumbai".into()),
            state: Some("Maharashtra".into()),
            ..Hospital::default()
        },
        units_needed,
        urgency: Urgency::High,
        description: Some("scheduled surgery".into()),
    }
}

struct Fixture {
    users: Arc<InMemoryUsers>,
    requests: Arc<InMemoryRequests>,
    donations: Arc<InMemoryDonations>,
    mailer: Arc<RecordingMailer>,
}

impl Fixture {
    fn seeded(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: Arc::new(InMemoryUsers::seeded(users)),
            requests: Arc::new(InMemoryRequests::default()),
            donations: Arc::new(InMemoryDonations::default()),
            mailer: Arc::new(RecordingMailer::default()),
        }
    }

    fn request_service(&self) -> RequestService<InMemoryRequests, RecordingMailer> {
        RequestService::new(Arc::clone(&self.requests), Arc::clone(&self.mailer))
    }

    fn match_service(&self) -> MatchService<InMemoryRequests, InMemoryUsers, RecordingMailer> {
        MatchService::new(
            Arc::clone(&self.requests),
            Arc::clone(&self.users),
            Arc::clone(&self.mailer),
        )
    }

    fn donation_service(
        &self,
    ) -> DonationService<InMemoryDonations, InMemoryRequests, InMemoryUsers> {
        DonationService::new(
            Arc::clone(&self.donations),
            Arc::clone(&self.requests),
            Arc::clone(&self.users),
        )
    }
}

#[actix_rt::test]
async fn matched_donations_fulfil_the_request_once_verified() {
    let riya = requester();
    let dana = donor("dana", BloodType::ONegative);
    let mut vik = donor("vik", BloodType::OPositive);
    vik.donation_count = 3;
    let mut cold = donor("cold", BloodType::ONegative);
    cold.last_donation = Some(Utc::now() - Duration::days(30));
    let incompatible = donor("bhavin", BloodType::BPositive);
    let mut admin = User::new("sub|admin", "admin@example.com", "Admin");
    admin.is_admin = true;

    let fixture = Fixture::seeded([
        riya.clone(),
        dana.clone(),
        vik.clone(),
        cold,
        incompatible,
        admin.clone(),
    ]);

    let request = fixture
        .request_service()
        .create(&riya, new_request(2))
        .await
        .expect("request created");
    assert_eq!(request.status, RequestStatus::Open);
    assert_eq!(fixture.mailer.sent(), vec!["request-confirmation:riya@example.com"]);

    // Fewest donations first; the cooling-down and incompatible donors are out.
    let candidates = fixture
        .match_service()
        .candidates(&request.id, LocationFilter::default())
        .await
        .expect("candidates");
    let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["dana", "vik"]);

    let matched = fixture
        .match_service()
        .match_donors(&riya, &request.id)
        .await
        .expect("matched");
    assert_eq!(matched.status, RequestStatus::InProgress);
    assert_eq!(matched.matched_donors.len(), 2);
    let sent = fixture.mailer.sent();
    assert!(sent.contains(&"donor-match:dana@example.com".to_owned()));
    assert!(sent.contains(&"donor-match:vik@example.com".to_owned()));

    // Dana donates against the request.
    let donation = fixture
        .donation_service()
        .record(
            &dana,
            NewDonation {
                request: Some(request.id),
                hospital: Hospital {
                    name: "City Hospital".into(),
                    ..Hospital::default()
                },
                units: 1,
                donation_date: None,
                notes: None,
            },
        )
        .await
        .expect("recorded");

    let dana_after = fixture.users.get(&dana.id).expect("dana persisted");
    assert_eq!(dana_after.donation_count, 1);
    assert!(!dana_after.is_eligible);
    let after_donation = fixture.requests.get(&request.id).expect("request");
    let dana_entry = after_donation
        .matched_donors
        .iter()
        .find(|m| m.donor == dana.id)
        .expect("dana matched");
    assert_eq!(dana_entry.status, MatchStatus::Donated);

    // One verified unit out of two: not fulfilled yet.
    fixture
        .donation_service()
        .verify(&admin, &donation.id)
        .await
        .expect("verified");
    assert_eq!(
        fixture.requests.get(&request.id).expect("request").status,
        RequestStatus::InProgress
    );

    // The second verified unit tips the request over.
    let second = fixture
        .donation_service()
        .record(
            &vik,
            NewDonation {
                request: Some(request.id),
                hospital: Hospital {
                    name: "City Hospital".into(),
                    ..Hospital::default()
                },
                units: 1,
                donation_date: None,
                notes: None,
            },
        )
        .await
        .expect("recorded");
    fixture
        .donation_service()
        .verify(&admin, &second.id)
        .await
        .expect("verified");
    assert_eq!(
        fixture.requests.get(&request.id).expect("request").status,
        RequestStatus::Fulfilled
    );
}

#[actix_rt::test]
async fn candidate_cap_keeps_the_least_donating_donors() {
    let riya = requester();
    let limit = u32::try_from(CANDIDATE_LIMIT).expect("small constant");
    let mut seeded = vec![riya.clone()];
    for count in 0..=limit {
        let mut candidate = donor(&format!("d{count:02}"), BloodType::ONegative);
        candidate.donation_count = count;
        seeded.push(candidate);
    }
    let fixture = Fixture::seeded(seeded);

    let request = fixture
        .request_service()
        .create(&riya, new_request(1))
        .await
        .expect("request created");

    let candidates = fixture
        .match_service()
        .candidates(&request.id, LocationFilter::default())
        .await
        .expect("candidates");
    let counts: Vec<u32> = candidates.iter().map(|c| c.donation_count).collect();
    assert_eq!(candidates.len(), CANDIDATE_LIMIT);
    assert_eq!(counts.first(), Some(&0));
    // The heaviest donor is the one the cap drops.
    assert!(counts.iter().all(|&c| c < limit));
    assert!(counts.windows(2).all(|w| w[0] < w[1]));
}

#[actix_rt::test]
async fn volunteering_is_idempotent_and_notifies_the_requester() {
    let riya = requester();
    let vol = donor("vol", BloodType::ONegative);
    let fixture = Fixture::seeded([riya.clone(), vol.clone()]);

    let request = fixture
        .request_service()
        .create(&riya, new_request(1))
        .await
        .expect("request created");

    let after = fixture
        .match_service()
        .volunteer(&vol, &request.id)
        .await
        .expect("volunteered");
    assert_eq!(after.status, RequestStatus::InProgress);
    assert_eq!(after.matched_donors.len(), 1);
    assert!(
        fixture
            .mailer
            .sent()
            .contains(&"requester-notification:riya@example.com".to_owned())
    );

    // Second volunteer call leaves one entry and sends no second mail.
    let mails_before = fixture.mailer.sent().len();
    let again = fixture
        .match_service()
        .volunteer(&vol, &request.id)
        .await
        .expect("still fine");
    assert_eq!(again.matched_donors.len(), 1);
    assert_eq!(fixture.mailer.sent().len(), mails_before);
}

#[actix_rt::test]
async fn requesters_and_ineligible_donors_cannot_volunteer() {
    let riya = requester();
    let mut cooling_down = donor("cold", BloodType::ONegative);
    cooling_down.last_donation = Some(Utc::now() - Duration::days(10));
    let fixture = Fixture::seeded([riya.clone(), cooling_down.clone()]);

    let request = fixture
        .request_service()
        .create(&riya, new_request(1))
        .await
        .expect("request created");

    let err = fixture
        .match_service()
        .volunteer(&riya, &request.id)
        .await
        .expect_err("own request");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);

    let err = fixture
        .match_service()
        .volunteer(&cooling_down, &request.id)
        .await
        .expect_err("cooling down");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[actix_rt::test]
async fn bearer_tokens_create_an_account_on_first_sight_only() {
    let fixture = Fixture::seeded([]);
    let identity = Arc::new(
        StaticIdentityProvider::default().with_token("tok", "auth0|new", "new@example.com"),
    );
    let users = UserService::new(
        Arc::clone(&fixture.users),
        identity,
        Arc::clone(&fixture.mailer),
    );

    let created = users.authenticate_bearer("tok").await.expect("created");
    assert_eq!(created.external_id, "auth0|new");
    assert_eq!(fixture.mailer.sent(), vec!["welcome:new@example.com"]);

    let returning = users.authenticate_bearer("tok").await.expect("found");
    assert_eq!(returning.id, created.id);
    // No second welcome.
    assert_eq!(fixture.mailer.sent().len(), 1);

    let err = users
        .authenticate_bearer("bogus")
        .await
        .expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}
