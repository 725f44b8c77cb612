//! Request lifecycle rules exercised over the in-memory adapters.

mod support;

use std::sync::Arc;

use pagination::PageRequest;

use bloodconnect::domain::ports::{
    DonationsService, NewDonation, NewRequest, RequestListFilter, RequestUpdate, RequestsService,
};
use bloodconnect::domain::{
    BloodType, DonationService, ErrorCode, Hospital, Patient, RequestService, RequestStatus,
    Urgency, User,
};

use support::{InMemoryDonations, InMemoryRequests, InMemoryUsers, RecordingMailer};

fn requester(name: &str) -> User {
    User::new(format!("sub|{name}"), format!("{name}@example.com"), name)
}

fn new_request(units_needed: u32, urgency: Urgency) -> NewRequest {
    NewRequest {
        patient: Patient {
            name: "Patient".into(),
            blood_type: BloodType::BNegative,
            age: None,
            gender: None,
        },
        hospital: Hospital {
            name: "City Hospital".into(),
            city: Some("Pune".into()),
            ..Hospital::default()
        },
        units_needed,
        urgency,
        description: None,
    }
}

fn request_service(
    requests: &Arc<InMemoryRequests>,
    mailer: &Arc<RecordingMailer>,
) -> RequestService<InMemoryRequests, RecordingMailer> {
    RequestService::new(Arc::clone(requests), Arc::clone(mailer))
}

#[actix_rt::test]
async fn updates_are_owner_only_and_stop_after_closure() {
    let requests = Arc::new(InMemoryRequests::default());
    let mailer = Arc::new(RecordingMailer::default());
    let service = request_service(&requests, &mailer);

    let owner = requester("riya");
    let request = service
        .create(&owner, new_request(2, Urgency::Medium))
        .await
        .expect("created");

    let updated = service
        .update(
            &owner,
            &request.id,
            RequestUpdate {
                urgency: Some(Urgency::Critical),
                description: Some("moved forward".into()),
                ..RequestUpdate::default()
            },
        )
        .await
        .expect("updated");
    assert_eq!(updated.urgency, Urgency::Critical);
    assert_eq!(updated.description.as_deref(), Some("moved forward"));

    let stranger = requester("sam");
    let err = service
        .update(&stranger, &request.id, RequestUpdate::default())
        .await
        .expect_err("not the owner");
    assert_eq!(err.code(), ErrorCode::Forbidden);

    let cancelled = service.cancel(&owner, &request.id).await.expect("cancelled");
    assert_eq!(cancelled.status, RequestStatus::Closed);

    let err = service
        .update(&owner, &request.id, RequestUpdate::default())
        .await
        .expect_err("closed");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[actix_rt::test]
async fn fulfilled_requests_cannot_be_cancelled() {
    let requests = Arc::new(InMemoryRequests::default());
    let donations = Arc::new(InMemoryDonations::default());
    let mailer = Arc::new(RecordingMailer::default());
    let service = request_service(&requests, &mailer);

    let owner = requester("riya");
    let mut donor = requester("dana");
    donor.blood_type = Some(BloodType::ONegative);
    let mut admin = requester("admin");
    admin.is_admin = true;
    let users = Arc::new(InMemoryUsers::seeded([
        owner.clone(),
        donor.clone(),
        admin.clone(),
    ]));
    let donation_service =
        DonationService::new(Arc::clone(&donations), Arc::clone(&requests), users);

    let request = service
        .create(&owner, new_request(1, Urgency::High))
        .await
        .expect("created");
    let donation = donation_service
        .record(
            &donor,
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
    donation_service
        .verify(&admin, &donation.id)
        .await
        .expect("verified");
    assert_eq!(
        requests.get(&request.id).expect("request").status,
        RequestStatus::Fulfilled
    );

    let err = service
        .cancel(&owner, &request.id)
        .await
        .expect_err("fulfilled");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[actix_rt::test]
async fn listings_filter_and_page_newest_first() {
    let requests = Arc::new(InMemoryRequests::default());
    let mailer = Arc::new(RecordingMailer::default());
    let service = request_service(&requests, &mailer);
    let owner = requester("riya");

    for urgency in [Urgency::Low, Urgency::Critical, Urgency::Critical] {
        service
            .create(&owner, new_request(1, urgency))
            .await
            .expect("created");
    }

    let all = service
        .list(
            RequestListFilter::default(),
            PageRequest::try_new(Some(1), Some(2)).expect("valid"),
        )
        .await
        .expect("page");
    assert_eq!(all.total, 3);
    assert_eq!(all.items.len(), 2);

    let critical = service
        .list(
            RequestListFilter {
                urgency: Some(Urgency::Critical),
                ..RequestListFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .expect("page");
    assert_eq!(critical.total, 2);
    assert!(critical.items.iter().all(|r| r.urgency == Urgency::Critical));
}

#[actix_rt::test]
async fn deleting_a_request_keeps_recorded_donations() {
    let requests = Arc::new(InMemoryRequests::default());
    let donations = Arc::new(InMemoryDonations::default());
    let mailer = Arc::new(RecordingMailer::default());
    let service = request_service(&requests, &mailer);

    let owner = requester("riya");
    let mut donor = requester("dana");
    donor.blood_type = Some(BloodType::ONegative);
    let users = Arc::new(InMemoryUsers::seeded([owner.clone(), donor.clone()]));
    let donation_service = DonationService::new(
        Arc::clone(&donations),
        Arc::clone(&requests),
        Arc::clone(&users),
    );

    let request = service
        .create(&owner, new_request(2, Urgency::Medium))
        .await
        .expect("created");
    donation_service
        .record(
            &donor,
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

    service.delete(&owner, &request.id).await.expect("deleted");
    assert!(requests.get(&request.id).is_none());
    let history = donation_service
        .my_donations(&donor.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 1);

    let err = service
        .get(&request.id)
        .await
        .expect_err("gone");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
