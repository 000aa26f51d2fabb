// 📅 ChurchEvent Entity - services, activities and meetings
//
// Invariants:
// - id unique within the collection
// - name and date non-empty at creation

use super::{labeled_enum, today, Entity, SortOrder};
use crate::validation::{Checker, Validate, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventType {
    #[default]
    #[serde(rename = "Ibadah")]
    Worship,

    #[serde(rename = "Kegiatan")]
    Activity,

    #[serde(rename = "Pelayanan")]
    Service,

    #[serde(rename = "Rapat")]
    Meeting,
}

labeled_enum!(EventType {
    Worship => "Ibadah",
    Activity => "Kegiatan",
    Service => "Pelayanan",
    Meeting => "Rapat",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventStatus {
    #[default]
    #[serde(rename = "Mendatang")]
    Upcoming,

    #[serde(rename = "Berlangsung")]
    Ongoing,

    #[serde(rename = "Selesai")]
    Finished,
}

labeled_enum!(EventStatus {
    Upcoming => "Mendatang",
    Ongoing => "Berlangsung",
    Finished => "Selesai",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurchEvent {
    pub id: String,
    pub name: String,
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub description: String,
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewChurchEvent {
    pub name: String,
    pub date: String,
    pub time: String,
    pub location: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub description: String,
    pub status: EventStatus,
}

impl Default for NewChurchEvent {
    fn default() -> Self {
        NewChurchEvent {
            name: String::new(),
            date: today(),
            time: "09:00".to_string(),
            location: String::new(),
            event_type: EventType::Worship,
            description: String::new(),
            status: EventStatus::Upcoming,
        }
    }
}

impl NewChurchEvent {
    pub fn new(name: impl Into<String>, date: impl Into<String>) -> Self {
        NewChurchEvent {
            name: name.into(),
            date: date.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChurchEventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
}

impl From<NewChurchEvent> for ChurchEventPatch {
    fn from(form: NewChurchEvent) -> Self {
        ChurchEventPatch {
            name: Some(form.name),
            date: Some(form.date),
            time: Some(form.time),
            location: Some(form.location),
            event_type: Some(form.event_type),
            description: Some(form.description),
            status: Some(form.status),
        }
    }
}

impl Validate for NewChurchEvent {
    fn validate(&self) -> ValidationResult {
        let mut check = Checker::new("Event");
        check.required("name", &self.name);
        check.required("date", &self.date);
        check.date("date", &self.date);
        check.finish()
    }
}

impl Validate for ChurchEventPatch {
    fn validate(&self) -> ValidationResult {
        let mut check = Checker::new("Event");
        check.required_if_present("name", self.name.as_deref());
        check.required_if_present("date", self.date.as_deref());
        check.date_if_present("date", self.date.as_deref());
        check.finish()
    }
}

impl ChurchEvent {
    pub fn is_upcoming(&self) -> bool {
        self.status == EventStatus::Upcoming
    }

    fn seed_row(
        id: &str,
        name: &str,
        date: &str,
        time: &str,
        location: &str,
        event_type: EventType,
        description: &str,
    ) -> Self {
        ChurchEvent {
            id: id.to_string(),
            name: name.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            location: location.to_string(),
            event_type,
            description: description.to_string(),
            status: EventStatus::Upcoming,
            created_at: None,
        }
    }
}

impl Entity for ChurchEvent {
    type New = NewChurchEvent;
    type Patch = ChurchEventPatch;

    const KIND: &'static str = "event";
    const COLLECTION_KEY: &'static str = "church_events";
    const TABLE: &'static str = "events";
    const ORDER: SortOrder = SortOrder::asc("date");

    fn id(&self) -> &str {
        &self.id
    }

    fn from_new(id: String, created_at: DateTime<Utc>, new: NewChurchEvent) -> Self {
        ChurchEvent {
            id,
            name: new.name,
            date: new.date,
            time: new.time,
            location: new.location,
            event_type: new.event_type,
            description: new.description,
            status: new.status,
            created_at: Some(created_at),
        }
    }

    fn apply(&mut self, patch: &ChurchEventPatch) {
        if let Some(v) = &patch.name {
            self.name = v.clone();
        }
        if let Some(v) = &patch.date {
            self.date = v.clone();
        }
        if let Some(v) = &patch.time {
            self.time = v.clone();
        }
        if let Some(v) = &patch.location {
            self.location = v.clone();
        }
        if let Some(v) = patch.event_type {
            self.event_type = v;
        }
        if let Some(v) = &patch.description {
            self.description = v.clone();
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
    }

    fn seed() -> Vec<Self> {
        vec![
            ChurchEvent::seed_row(
                "e-0001",
                "Ibadah Paskah",
                "2026-04-20",
                "09:00",
                "Gedung Utama",
                EventType::Worship,
                "Ibadah perayaan Paskah bersama seluruh jemaat",
            ),
            ChurchEvent::seed_row(
                "e-0002",
                "Retreat Pemuda",
                "2026-04-25",
                "08:00",
                "Lembang",
                EventType::Activity,
                "Retreat tiga hari untuk komisi pemuda",
            ),
            ChurchEvent::seed_row(
                "e-0003",
                "Bakti Sosial",
                "2026-05-03",
                "07:00",
                "Balai Warga Cibeunying",
                EventType::Service,
                "Pembagian sembako dan pemeriksaan kesehatan gratis",
            ),
            ChurchEvent::seed_row(
                "e-0004",
                "Rapat Majelis",
                "2026-05-08",
                "19:00",
                "Ruang Konsistori",
                EventType::Meeting,
                "Rapat bulanan majelis jemaat",
            ),
        ]
    }
}
