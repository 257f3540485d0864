//! Demo data: wipes the store and fills it with a small Bergen portfolio.

use chrono::{DateTime, TimeZone, Utc};
use db::{
    DBService,
    change_feed::ChangeEvent,
    models::{
        booking::{Booking, CreateBooking},
        chat::{ChatMessage, ChatSender, CreateChatMessage},
        faq::{CreateFaq, Faq},
        partner::{CreatePartner, Partner},
        property::{CreateProperty, Property},
        task::{CreateTask, Task, TaskStatus, TaskType},
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Rows written by [`clear_and_seed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct SeedSummary {
    pub properties: usize,
    pub partners: usize,
    pub bookings: usize,
    pub tasks: usize,
    pub chat_messages: usize,
    pub faqs: usize,
}

const PROPERTIES: [(&str, &str, &str, &str); 3] = [
    (
        "Strandgata 15, 5004 Bergen, Norway",
        "Bergen_Apartment_Guest",
        "Welcome2024!",
        "Enter through the main entrance. Use keycode 1234 on the door. Your apartment is on the 2nd floor, door 2A. Key box code: 5678 (located next to the mailboxes).",
    ),
    (
        "Fisketorget 8, 5014 Bergen, Norway",
        "Fisketorget_WiFi",
        "Harbor123",
        "Building entrance is on the harbor side. Ring bell #3 or use mobile app. Apartment key is in the electronic lock box - code will be sent 2 hours before check-in.",
    ),
    (
        "Nygårdsgaten 45, 5015 Bergen, Norway",
        "Nygard_Guest",
        "Student2024",
        "University area entrance: Use student card or call +47 55 000 000. Take elevator to 4th floor. Blue door at the end of the corridor. Smart lock code: your check-in date (DDMM format).",
    ),
];

const PARTNERS: [(&str, &str, &str, TaskType); 3] = [
    ("Bergen Clean Pro", "contact@bergenclean.no", "+47 55 12 34 56", TaskType::Cleaning),
    ("Fjord Maintenance", "service@fjordmaint.no", "+47 55 98 76 54", TaskType::Maintenance),
    ("Quality Inspections AS", "info@qualityinsp.no", "+47 55 11 22 33", TaskType::Inspection),
];

/// Guest, email, property index, check-in and check-out as (month, day, hour).
const BOOKINGS: [(&str, &str, usize, (u32, u32, u32), (u32, u32, u32)); 3] = [
    ("Emma Hansen", "emma.hansen@gmail.com", 0, (10, 15, 16), (10, 20, 11)),
    ("Lars Andersen", "lars.andersen@outlook.com", 1, (10, 18, 15), (10, 25, 10)),
    ("Sophie Schmidt", "sophie.schmidt@gmail.com", 2, (10, 22, 17), (10, 28, 12)),
];

struct SeedTask {
    description: &'static str,
    property: usize,
    booking: Option<usize>,
    partner: usize,
    task_type: TaskType,
    status: TaskStatus,
    due: (u32, u32, u32),
    can_start_after: Option<(u32, u32, u32)>,
}

const TASKS: [SeedTask; 4] = [
    SeedTask {
        description: "Deep cleaning after guest checkout",
        property: 0,
        booking: Some(0),
        partner: 0,
        task_type: TaskType::Cleaning,
        status: TaskStatus::Confirmed,
        due: (10, 21, 12),
        can_start_after: Some((10, 20, 11)),
    },
    SeedTask {
        description: "Fix leaking kitchen faucet",
        property: 1,
        booking: Some(1),
        partner: 1,
        task_type: TaskType::Maintenance,
        status: TaskStatus::InProgress,
        due: (10, 17, 14),
        can_start_after: None,
    },
    SeedTask {
        description: "Monthly property inspection",
        property: 2,
        booking: None,
        partner: 2,
        task_type: TaskType::Inspection,
        status: TaskStatus::Pending,
        due: (10, 30, 10),
        can_start_after: None,
    },
    SeedTask {
        description: "Pre-arrival apartment preparation",
        property: 2,
        booking: Some(2),
        partner: 0,
        task_type: TaskType::Cleaning,
        status: TaskStatus::Pending,
        due: (10, 22, 15),
        can_start_after: None,
    },
];

const BOOKING_MESSAGES: [(usize, &str, ChatSender); 5] = [
    (0, "Thanks for your booking! We're excited to host you in Bergen.", ChatSender::Agent),
    (0, "Thank you! I'm looking forward to my stay. What time is check-in exactly?", ChatSender::User),
    (0, "Check-in is from 4:00 PM. We'll send you access instructions closer to your arrival date.", ChatSender::Agent),
    (1, "Welcome to Bergen! Your reservation is confirmed.", ChatSender::Agent),
    (2, "Thanks for choosing our property! Let us know if you have any questions.", ChatSender::Agent),
];

const TASK_MESSAGES: [(usize, &str, ChatSender); 4] = [
    (0, "Cleaning task has been assigned. We'll complete it by the due date.", ChatSender::Partner),
    (1, "Received maintenance request for kitchen faucet. Will fix tomorrow morning.", ChatSender::Partner),
    (1, "Perfect, thank you! The tenant mentioned it's been dripping for a few days.", ChatSender::Agent),
    (2, "Monthly inspection scheduled. Will provide detailed report after completion.", ChatSender::Partner),
];

/// Question, answer, and the property it belongs to (none for general FAQs).
const FAQS: [(&str, &str, Option<usize>); 6] = [
    (
        "What is the WiFi password?",
        "The WiFi password varies by property. Check your welcome message or the information sheet in your apartment.",
        None,
    ),
    (
        "What time is check-in and check-out?",
        "Check-in is typically from 4:00 PM and check-out is by 11:00 AM. Specific times will be provided in your booking confirmation.",
        None,
    ),
    (
        "Where can I find the nearest grocery store?",
        "There's a Rema 1000 just 200 meters from the property on Strandgata. It's open daily from 8:00 AM to 11:00 PM.",
        Some(0),
    ),
    (
        "Is parking available?",
        "Street parking is available in the area. Please note that some spaces require payment during weekdays from 9:00 AM to 5:00 PM.",
        Some(1),
    ),
    (
        "How do I contact emergency services?",
        "For emergencies, dial 112. For non-urgent issues, contact our support team through the app or call +47 55 00 00 00.",
        None,
    ),
    (
        "Can I have guests over?",
        "Small gatherings are allowed, but please respect the neighbors and keep noise levels down, especially after 10:00 PM.",
        Some(2),
    ),
];

/// All seed dates fall in October 2024, UTC.
fn at((month, day, hour): (u32, u32, u32)) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, hour, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Empty every table, children first, then insert the demo data. Every row
/// removed or added is announced on the change feed.
pub async fn clear_and_seed(db: &DBService) -> Result<SeedSummary, SeedError> {
    clear(db).await?;

    let mut properties = Vec::with_capacity(PROPERTIES.len());
    for (address, ssid, password, access) in PROPERTIES {
        let data = CreateProperty {
            address: address.to_string(),
            wifi_ssid: Some(ssid.to_string()),
            wifi_password: Some(password.to_string()),
            access_instructions: Some(access.to_string()),
        };
        let property = Property::create(&db.pool, &data, Uuid::new_v4()).await?;
        db.changes.publish(ChangeEvent::insert(property.clone()));
        properties.push(property);
    }

    let mut partners = Vec::with_capacity(PARTNERS.len());
    for (name, email, phone, partner_type) in PARTNERS {
        let data = CreatePartner {
            name: name.to_string(),
            email: email.to_string(),
            phone: Some(phone.to_string()),
            partner_type,
        };
        let partner = Partner::create(&db.pool, &data, Uuid::new_v4()).await?;
        db.changes.publish(ChangeEvent::insert(partner.clone()));
        partners.push(partner);
    }

    let mut bookings = Vec::with_capacity(BOOKINGS.len());
    for (guest_name, guest_email, property, check_in, check_out) in BOOKINGS {
        let data = CreateBooking {
            guest_name: guest_name.to_string(),
            guest_email: guest_email.to_string(),
            property_id: properties[property].id,
            check_in_date_time: at(check_in),
            check_out_date_time: at(check_out),
        };
        let booking = Booking::create(&db.pool, &data, Uuid::new_v4()).await?;
        db.changes.publish(ChangeEvent::insert(booking.clone()));
        bookings.push(booking);
    }

    let mut tasks = Vec::with_capacity(TASKS.len());
    for seed in &TASKS {
        let mut data = CreateTask::new(seed.description, properties[seed.property].id, seed.task_type);
        data.booking_id = seed.booking.map(|i| bookings[i].id);
        data.partner_id = Some(partners[seed.partner].id);
        data.status = Some(seed.status);
        data.due_date = Some(at(seed.due));
        data.can_start_after = seed.can_start_after.map(at);
        let task = Task::create(&db.pool, &data, Uuid::new_v4()).await?;
        db.changes.publish(ChangeEvent::insert(task.clone()));
        tasks.push(task);
    }

    let chat = BOOKING_MESSAGES
        .iter()
        .map(|&(i, text, sender)| CreateChatMessage::for_booking(bookings[i].id, text, sender))
        .chain(
            TASK_MESSAGES
                .iter()
                .map(|&(i, text, sender)| CreateChatMessage::for_task(tasks[i].id, text, sender)),
        )
        .collect::<Vec<_>>();
    for data in &chat {
        let message = ChatMessage::create(&db.pool, data, Uuid::new_v4()).await?;
        db.changes.publish(ChangeEvent::insert(message));
    }

    for (question, answer, property) in FAQS {
        let data = CreateFaq {
            question: question.to_string(),
            answer: answer.to_string(),
            property_id: property.map(|i| properties[i].id),
        };
        let faq = Faq::create(&db.pool, &data, Uuid::new_v4()).await?;
        db.changes.publish(ChangeEvent::insert(faq));
    }

    let summary = SeedSummary {
        properties: properties.len(),
        partners: partners.len(),
        bookings: bookings.len(),
        tasks: tasks.len(),
        chat_messages: chat.len(),
        faqs: FAQS.len(),
    };
    info!(?summary, "database seeded");
    Ok(summary)
}

async fn clear(db: &DBService) -> Result<(), SeedError> {
    let removed = ChatMessage::delete_all(&db.pool).await?;
    publish_deletes(db, removed);
    let removed = Task::delete_all(&db.pool).await?;
    publish_deletes(db, removed);
    let removed = Booking::delete_all(&db.pool).await?;
    publish_deletes(db, removed);
    let removed = Faq::delete_all(&db.pool).await?;
    publish_deletes(db, removed);
    let removed = Partner::delete_all(&db.pool).await?;
    publish_deletes(db, removed);
    let removed = Property::delete_all(&db.pool).await?;
    publish_deletes(db, removed);
    Ok(())
}

fn publish_deletes<T: Into<db::change_feed::Record>>(db: &DBService, rows: Vec<T>) {
    for row in rows {
        db.changes.publish(ChangeEvent::delete(row));
    }
}
