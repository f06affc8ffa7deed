use crate::types::ExtractionResponse;

/// A field filled by document extraction, with the question that fills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionField {
    Age,
    Name,
    Meds,
    Injury,
}

impl ExtractionField {
    /// Every field, in the order the questions are asked.
    pub const ALL: [ExtractionField; 4] = [
        ExtractionField::Age,
        ExtractionField::Name,
        ExtractionField::Meds,
        ExtractionField::Injury,
    ];

    /// Key of the field in the response object.
    pub fn key(&self) -> &'static str {
        match self {
            ExtractionField::Age => "age",
            ExtractionField::Name => "name",
            ExtractionField::Meds => "meds",
            ExtractionField::Injury => "injury",
        }
    }

    pub fn question(&self) -> &'static str {
        match self {
            ExtractionField::Age => {
                "What is the patient's age using their date of birth (DOB) or directly as stated? Remember to keep your output as short as possible while fully answering the question. Output a single number or 'Don't know'"
            }
            ExtractionField::Name => {
                "What is the patient's name using their medical record or directly as stated? Remember to keep your output as short as possible while fully answering the question. Output only their name and no extra information"
            }
            ExtractionField::Meds => {
                "What are all the medications the patient has taken in the past or present using their medical record or directly as stated? Remember to keep your output as short as possible while fully answering the question. Your JSON should have 2 keys - 'past' and 'present'. Output only the JSON of their medications and dosages and no extra information"
            }
            ExtractionField::Injury => {
                "What was the injury or cause of pain as determined by the healthcare team using their medical record or directly as stated? Remember to keep your output as short as possible while fully answering the question. Your JSON should have a single key 'diagnosis'. Output only their final diagnosis and no extra information"
            }
        }
    }
}

/// Collects one answer per field.
#[derive(Debug, Default)]
pub struct ExtractionBuilder {
    age: Option<String>,
    name: Option<String>,
    meds: Option<String>,
    injury: Option<String>,
}

impl ExtractionBuilder {
    pub fn set(&mut self, field: ExtractionField, answer: String) {
        let slot = match field {
            ExtractionField::Age => &mut self.age,
            ExtractionField::Name => &mut self.name,
            ExtractionField::Meds => &mut self.meds,
            ExtractionField::Injury => &mut self.injury,
        };
        *slot = Some(answer);
    }

    /// The response, or the first field that was never answered.
    pub fn build(self) -> Result<ExtractionResponse, ExtractionField> {
        Ok(ExtractionResponse {
            age: self.age.ok_or(ExtractionField::Age)?,
            name: self.name.ok_or(ExtractionField::Name)?,
            meds: self.meds.ok_or(ExtractionField::Meds)?,
            injury: self.injury.ok_or(ExtractionField::Injury)?,
        })
    }
}
