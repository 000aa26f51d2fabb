// 👥 Member Entity - congregation roll
//
// Invariants:
// - id unique within the collection
// - name and phone non-empty at creation

use super::{labeled_enum, today, Entity, SortOrder};
use crate::validation::{Checker, Validate, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// MEMBER ENUMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MemberStatus {
    #[default]
    #[serde(rename = "Aktif")]
    Active,

    #[serde(rename = "Tidak Aktif")]
    Inactive,

    /// Moved in from (or out to) another congregation
    #[serde(rename = "Pindahan")]
    Transferred,
}

labeled_enum!(MemberStatus {
    Active => "Aktif",
    Inactive => "Tidak Aktif",
    Transferred => "Pindahan",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Gender {
    #[default]
    #[serde(rename = "Laki-laki")]
    Male,

    #[serde(rename = "Perempuan")]
    Female,
}

labeled_enum!(Gender {
    Male => "Laki-laki",
    Female => "Perempuan",
});

// ============================================================================
// MEMBER ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub join_date: String,
    pub status: MemberStatus,
    pub gender: Gender,
    #[serde(default)]
    pub baptized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create payload: every field except the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub birth_date: String,
    pub join_date: String,
    pub status: MemberStatus,
    pub gender: Gender,
    pub baptized: bool,
}

impl Default for NewMember {
    fn default() -> Self {
        NewMember {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            birth_date: String::new(),
            join_date: today(),
            status: MemberStatus::Active,
            gender: Gender::Male,
            baptized: false,
        }
    }
}

impl NewMember {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        NewMember {
            name: name.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }
}

/// Partial update. Absent fields are left untouched and never serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MemberStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baptized: Option<bool>,
}

impl From<NewMember> for MemberPatch {
    /// Full-form edit: every field is replaced.
    fn from(form: NewMember) -> Self {
        MemberPatch {
            name: Some(form.name),
            email: Some(form.email),
            phone: Some(form.phone),
            address: Some(form.address),
            birth_date: Some(form.birth_date),
            join_date: Some(form.join_date),
            status: Some(form.status),
            gender: Some(form.gender),
            baptized: Some(form.baptized),
        }
    }
}

impl Validate for NewMember {
    fn validate(&self) -> ValidationResult {
        let mut check = Checker::new("Member");
        check.required("name", &self.name);
        check.required("phone", &self.phone);
        check.date("birth_date", &self.birth_date);
        check.date("join_date", &self.join_date);
        check.finish()
    }
}

impl Validate for MemberPatch {
    fn validate(&self) -> ValidationResult {
        let mut check = Checker::new("Member");
        check.required_if_present("name", self.name.as_deref());
        check.required_if_present("phone", self.phone.as_deref());
        check.date_if_present("birth_date", self.birth_date.as_deref());
        check.date_if_present("join_date", self.join_date.as_deref());
        check.finish()
    }
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    fn seed_row(
        id: &str,
        name: &str,
        email: &str,
        phone: &str,
        address: &str,
        birth_date: &str,
        join_date: &str,
        status: MemberStatus,
        gender: Gender,
        baptized: bool,
    ) -> Self {
        Member {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            address: address.to_string(),
            birth_date: birth_date.to_string(),
            join_date: join_date.to_string(),
            status,
            gender,
            baptized,
            created_at: None,
        }
    }
}

impl Entity for Member {
    type New = NewMember;
    type Patch = MemberPatch;

    const KIND: &'static str = "member";
    const COLLECTION_KEY: &'static str = "church_members";
    const TABLE: &'static str = "members";
    const ORDER: SortOrder = SortOrder::desc("created_at");

    fn id(&self) -> &str {
        &self.id
    }

    fn from_new(id: String, created_at: DateTime<Utc>, new: NewMember) -> Self {
        Member {
            id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            address: new.address,
            birth_date: new.birth_date,
            join_date: new.join_date,
            status: new.status,
            gender: new.gender,
            baptized: new.baptized,
            created_at: Some(created_at),
        }
    }

    fn apply(&mut self, patch: &MemberPatch) {
        if let Some(v) = &patch.name {
            self.name = v.clone();
        }
        if let Some(v) = &patch.email {
            self.email = v.clone();
        }
        if let Some(v) = &patch.phone {
            self.phone = v.clone();
        }
        if let Some(v) = &patch.address {
            self.address = v.clone();
        }
        if let Some(v) = &patch.birth_date {
            self.birth_date = v.clone();
        }
        if let Some(v) = &patch.join_date {
            self.join_date = v.clone();
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.gender {
            self.gender = v;
        }
        if let Some(v) = patch.baptized {
            self.baptized = v;
        }
    }

    fn seed() -> Vec<Self> {
        vec![
            Member::seed_row(
                "m-0001",
                "Maria Susanti",
                "maria.susanti@email.com",
                "081234567801",
                "Jl. Merdeka No. 12, Bandung",
                "1990-03-15",
                "2026-01-10",
                MemberStatus::Active,
                Gender::Female,
                true,
            ),
            Member::seed_row(
                "m-0002",
                "Budi Hartono",
                "budi.hartono@email.com",
                "081234567802",
                "Jl. Sudirman No. 45, Bandung",
                "1985-07-22",
                "2025-11-02",
                MemberStatus::Transferred,
                Gender::Male,
                true,
            ),
            Member::seed_row(
                "m-0003",
                "Sarah Wijaya",
                "sarah.wijaya@email.com",
                "081234567803",
                "Jl. Asia Afrika No. 8, Bandung",
                "1998-12-01",
                "2026-02-14",
                MemberStatus::Active,
                Gender::Female,
                false,
            ),
            Member::seed_row(
                "m-0004",
                "Yohanes Pratama",
                "yohanes.pratama@email.com",
                "081234567804",
                "Jl. Dago No. 101, Bandung",
                "2001-05-09",
                "2026-03-01",
                MemberStatus::Active,
                Gender::Male,
                true,
            ),
        ]
    }
}

// ============================================================================
// TESTS
// ============================================================================
