// 💰 FinanceRecord Entity - offerings and expenses
//
// Invariants:
// - id unique within the collection
// - category non-empty and 0 < amount <= MAX_AMOUNT
// - amount is a whole number of Rupiah (no minor unit)

use super::{labeled_enum, today, Entity, SortOrder};
use crate::validation::{Checker, Validate, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest single amount accepted (one trillion Rupiah).
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FinanceType {
    #[default]
    #[serde(rename = "Pemasukan")]
    Income,

    #[serde(rename = "Pengeluaran")]
    Expense,
}

labeled_enum!(FinanceType {
    Income => "Pemasukan",
    Expense => "Pengeluaran",
});

pub const INCOME_CATEGORIES: &[&str] = &[
    "Persembahan Minggu",
    "Perpuluhan",
    "Persembahan Khusus",
    "Donasi",
    "Lainnya",
];

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Operasional",
    "Pelayanan",
    "Perawatan",
    "Gaji Staf",
    "Kegiatan",
    "Lainnya",
];

/// Category suggestions offered by the entry form. Free text is still accepted.
pub fn categories_for(kind: FinanceType) -> &'static [&'static str] {
    match kind {
        FinanceType::Income => INCOME_CATEGORIES,
        FinanceType::Expense => EXPENSE_CATEGORIES,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceRecord {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: FinanceType,
    pub category: String,
    pub amount: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recorded_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewFinanceRecord {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: FinanceType,
    pub category: String,
    pub amount: i64,
    pub description: String,
    pub recorded_by: String,
}

impl Default for NewFinanceRecord {
    fn default() -> Self {
        NewFinanceRecord {
            date: today(),
            kind: FinanceType::Income,
            category: String::new(),
            amount: 0,
            description: String::new(),
            recorded_by: String::new(),
        }
    }
}

impl NewFinanceRecord {
    pub fn new(kind: FinanceType, category: impl Into<String>, amount: i64) -> Self {
        NewFinanceRecord {
            kind,
            category: category.into(),
            amount,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinanceRecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FinanceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<String>,
}

impl Validate for NewFinanceRecord {
    fn validate(&self) -> ValidationResult {
        let mut check = Checker::new("Finance");
        check.required("category", &self.category);
        check.positive("amount", self.amount);
        check.at_most("amount", self.amount, MAX_AMOUNT);
        check.date("date", &self.date);
        check.finish()
    }
}

impl Validate for FinanceRecordPatch {
    fn validate(&self) -> ValidationResult {
        let mut check = Checker::new("Finance");
        check.required_if_present("category", self.category.as_deref());
        if let Some(amount) = self.amount {
            check.positive("amount", amount);
            check.at_most("amount", amount, MAX_AMOUNT);
        }
        check.date_if_present("date", self.date.as_deref());
        check.finish()
    }
}

impl FinanceRecord {
    pub fn is_income(&self) -> bool {
        self.kind == FinanceType::Income
    }

    /// Amount with sign: income positive, expense negative.
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            FinanceType::Income => self.amount,
            FinanceType::Expense => -self.amount,
        }
    }

    fn seed_row(
        id: &str,
        date: &str,
        kind: FinanceType,
        category: &str,
        amount: i64,
        description: &str,
    ) -> Self {
        FinanceRecord {
            id: id.to_string(),
            date: date.to_string(),
            kind,
            category: category.to_string(),
            amount,
            description: description.to_string(),
            recorded_by: "Admin Gereja".to_string(),
            created_at: None,
        }
    }
}

impl Entity for FinanceRecord {
    type New = NewFinanceRecord;
    type Patch = FinanceRecordPatch;

    const KIND: &'static str = "finance record";
    const COLLECTION_KEY: &'static str = "church_finance";
    const TABLE: &'static str = "finance";
    const ORDER: SortOrder = SortOrder::desc("created_at");

    fn id(&self) -> &str {
        &self.id
    }

    fn from_new(id: String, created_at: DateTime<Utc>, new: NewFinanceRecord) -> Self {
        FinanceRecord {
            id,
            date: new.date,
            kind: new.kind,
            category: new.category,
            amount: new.amount,
            description: new.description,
            recorded_by: new.recorded_by,
            created_at: Some(created_at),
        }
    }

    fn apply(&mut self, patch: &FinanceRecordPatch) {
        if let Some(v) = &patch.date {
            self.date = v.clone();
        }
        if let Some(v) = patch.kind {
            self.kind = v;
        }
        if let Some(v) = &patch.category {
            self.category = v.clone();
        }
        if let Some(v) = patch.amount {
            self.amount = v;
        }
        if let Some(v) = &patch.description {
            self.description = v.clone();
        }
        if let Some(v) = &patch.recorded_by {
            self.recorded_by = v.clone();
        }
    }

    fn seed() -> Vec<Self> {
        vec![
            FinanceRecord::seed_row(
                "f-0001",
                "2026-03-01",
                FinanceType::Income,
                "Persembahan Minggu",
                12_500_000,
                "Persembahan ibadah minggu pertama",
            ),
            FinanceRecord::seed_row(
                "f-0002",
                "2026-03-03",
                FinanceType::Income,
                "Perpuluhan",
                8_750_000,
                "Perpuluhan bulan Maret",
            ),
            FinanceRecord::seed_row(
                "f-0003",
                "2026-03-05",
                FinanceType::Expense,
                "Operasional",
                2_300_000,
                "Listrik dan air",
            ),
            FinanceRecord::seed_row(
                "f-0004",
                "2026-03-10",
                FinanceType::Expense,
                "Gaji Staf",
                4_500_000,
                "Honor koster dan sekretariat",
            ),
        ]
    }
}
