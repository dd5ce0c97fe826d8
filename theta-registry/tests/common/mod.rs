#![allow(dead_code)]

use theta_model::{Entity, EntityType, FieldReader, FieldSpec, ModelResult, Schema, TypeCatalog};
use theta_types::{EntityRecord, Field, FieldValue, Handle, TypeTag};

#[derive(Debug, Clone, PartialEq)]
pub struct Counter {
    handle: Handle,
    pub value: i64,
    pub link: Option<Handle>,
}

impl Counter {
    pub fn new(handle: Handle, value: i64) -> Self {
        Self {
            handle,
            value,
            link: None,
        }
    }
}

impl Entity for Counter {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn save_fields(&self) -> Vec<FieldValue> {
        vec![self.value.into_value(), self.link.into_value()]
    }
}

impl EntityType for Counter {
    const TYPE_TAG: TypeTag = TypeTag::new(1);
    const NAME: &'static str = "Counter";

    fn schema() -> Schema {
        Schema::new(vec![FieldSpec::of::<i64>("value"), FieldSpec::reference("link")])
    }

    fn load(record: EntityRecord) -> ModelResult<Self> {
        let (handle, mut fields) = FieldReader::open(Self::NAME, record);
        let counter = Self {
            handle,
            value: fields.next()?,
            link: fields.next()?,
        };
        fields.finish()?;
        Ok(counter)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    handle: Handle,
    pub text: String,
}

impl Label {
    pub fn new(handle: Handle, text: &str) -> Self {
        Self {
            handle,
            text: text.into(),
        }
    }
}

impl Entity for Label {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn save_fields(&self) -> Vec<FieldValue> {
        vec![self.text.clone().into_value()]
    }
}

impl EntityType for Label {
    const TYPE_TAG: TypeTag = TypeTag::new(2);
    const NAME: &'static str = "Label";

    fn schema() -> Schema {
        Schema::new(vec![FieldSpec::of::<String>("text")])
    }

    fn load(record: EntityRecord) -> ModelResult<Self> {
        let (handle, mut fields) = FieldReader::open(Self::NAME, record);
        let label = Self {
            handle,
            text: fields.next()?,
        };
        fields.finish()?;
        Ok(label)
    }
}

pub fn catalog() -> TypeCatalog {
    TypeCatalog::builder()
        .register::<Counter>()
        .unwrap()
        .register::<Label>()
        .unwrap()
        .build()
        .unwrap()
}

pub fn counter_record(handle: u32, value: i64) -> EntityRecord {
    EntityRecord::new(
        Handle::new(handle),
        Counter::TYPE_TAG,
        vec![FieldValue::I64(value), FieldValue::Ref(None)],
    )
}
