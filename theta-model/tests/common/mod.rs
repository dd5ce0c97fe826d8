#![allow(dead_code)]

use theta_model::{
    BlobReader, BlobWriter, Entity, EntityType, FieldReader, FieldSpec, ModelResult, Schema,
    ValueBlob,
};
use theta_types::{BlobId, EntityRecord, Field, FieldValue, Handle, TypeTag};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl ValueBlob for Point {
    const BLOB_ID: BlobId = BlobId::new(1);
    const NAME: &'static str = "Point";
    const SIZE: usize = 8;

    fn write(&self, out: &mut BlobWriter) {
        out.put_f32(self.x);
        out.put_f32(self.y);
    }

    fn read(input: &mut BlobReader<'_>) -> ModelResult<Self> {
        Ok(Self {
            x: input.get_f32()?,
            y: input.get_f32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    handle: Handle,
    pub title: String,
    pub pinned: bool,
    pub anchor: Point,
    pub links: Vec<Option<Handle>>,
}

impl Note {
    pub fn new(handle: Handle, title: &str) -> Self {
        Self {
            handle,
            title: title.to_string(),
            pinned: false,
            anchor: Point { x: 0.0, y: 0.0 },
            links: Vec::new(),
        }
    }
}

impl Entity for Note {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn save_fields(&self) -> Vec<FieldValue> {
        vec![
            self.title.clone().into_value(),
            self.pinned.into_value(),
            self.anchor.to_value(),
            self.links.clone().into_value(),
        ]
    }
}

impl EntityType for Note {
    const TYPE_TAG: TypeTag = TypeTag::new(10);
    const NAME: &'static str = "Note";

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::of::<String>("title"),
            FieldSpec::of::<bool>("pinned"),
            FieldSpec::blob::<Point>("anchor"),
            FieldSpec::of::<Vec<Option<Handle>>>("links"),
        ])
    }

    fn load(record: EntityRecord) -> ModelResult<Self> {
        let (handle, mut fields) = FieldReader::open(Self::NAME, record);
        let note = Self {
            handle,
            title: fields.next()?,
            pinned: fields.next()?,
            anchor: fields.blob()?,
            links: fields.next()?,
        };
        fields.finish()?;
        Ok(note)
    }
}

/// Claims the same tag as [`Note`].
pub struct Impostor {
    handle: Handle,
}

impl Entity for Impostor {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn save_fields(&self) -> Vec<FieldValue> {
        Vec::new()
    }
}

impl EntityType for Impostor {
    const TYPE_TAG: TypeTag = TypeTag::new(10);
    const NAME: &'static str = "Impostor";

    fn schema() -> Schema {
        Schema::default()
    }

    fn load(record: EntityRecord) -> ModelResult<Self> {
        Ok(Self {
            handle: record.handle,
        })
    }
}

/// Uses the reserved freed-slot tag.
pub struct Reserved;

impl Entity for Reserved {
    fn handle(&self) -> Handle {
        Handle::new(0)
    }

    fn save_fields(&self) -> Vec<FieldValue> {
        Vec::new()
    }
}

impl EntityType for Reserved {
    const TYPE_TAG: TypeTag = TypeTag::FREED_SLOT;
    const NAME: &'static str = "Reserved";

    fn schema() -> Schema {
        Schema::default()
    }

    fn load(_record: EntityRecord) -> ModelResult<Self> {
        Ok(Self)
    }
}

/// Rebuilds itself under the wrong handle.
pub struct Drifter {
    handle: Handle,
}

impl Entity for Drifter {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn save_fields(&self) -> Vec<FieldValue> {
        Vec::new()
    }
}

impl EntityType for Drifter {
    const TYPE_TAG: TypeTag = TypeTag::new(11);
    const NAME: &'static str = "Drifter";

    fn schema() -> Schema {
        Schema::default()
    }

    fn load(record: EntityRecord) -> ModelResult<Self> {
        Ok(Self {
            handle: Handle::new(record.handle.get() + 1),
        })
    }
}

pub fn note_record(handle: u32, title: &str) -> EntityRecord {
    EntityRecord::new(
        Handle::new(handle),
        Note::TYPE_TAG,
        vec![
            FieldValue::from(title),
            FieldValue::Bool(true),
            Point { x: 1.5, y: -2.0 }.to_value(),
            vec![Some(Handle::new(3)), None].into_value(),
        ],
    )
}
