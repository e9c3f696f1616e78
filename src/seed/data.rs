use crate::model::{FormData, Id};
use crate::store::traits::Store;
use anyhow::Result;

/// Demo FormData rows: (id, question, answer)
const SEED_FORM_DATA: &[(&str, &str, &str)] = &[
    (
        "0b9f6f0e-1c3a-4d5e-9a7b-2f8c1d0e3a41",
        "What is your age?",
        "47",
    ),
    (
        "1c2e7a9d-3b4f-4e6a-8c0d-5a7b9c1e2f52",
        "Have you experienced any adverse events since the last visit?",
        "No",
    ),
    (
        "2d3f8b0e-4c5a-4f7b-9d1e-6b8c0d2f3a63",
        "Are you currently taking any concomitant medication?",
        "Yes, ibuprofen 200mg as needed",
    ),
    (
        "3e4a9c1f-5d6b-4a8c-8e2f-7c9d1e3a4b74",
        "What was your systolic blood pressure at screening (mmHg)?",
        "182",
    ),
    (
        "4f5b0d2a-6e7c-4b9d-9f3a-8d0e2f4b5c85",
        "Is the informed consent form signed and dated?",
        "Yes",
    ),
    (
        "5a6c1e3b-7f8d-4c0e-8a4b-9e1f3a5c6d96",
        "Did the participant complete the week 4 questionnaire?",
        "Partially",
    ),
];

pub fn seed_form_data() -> Result<Vec<FormData>> {
    SEED_FORM_DATA
        .iter()
        .map(|(id, question, answer)| {
            let id = Id::parse_str(id)?;
            Ok(FormData::new_with_id(id, *question, *answer))
        })
        .collect()
}

/// Insert the demo FormData rows. Rows that already exist are left alone.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    let mut inserted = 0;
    for form_data in seed_form_data()? {
        if store.insert_form_data(form_data).await? {
            inserted += 1;
        }
    }
    log::info!("Seeded {} form data rows", inserted);
    Ok(())
}
