#![allow(dead_code)]

use std::sync::Arc;
use theta_model::{
    BlobReader, BlobWriter, Entity, EntityType, FieldReader, FieldSpec, ModelResult, Schema,
    TypeCatalog, ValueBlob,
};
use theta_types::{BlobId, Decimal, EntityRecord, Field, FieldValue, Handle, TypeTag};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ValueBlob for Position {
    const BLOB_ID: BlobId = BlobId::new(1);
    const NAME: &'static str = "Position";
    const SIZE: usize = 12;

    fn write(&self, out: &mut BlobWriter) {
        out.put_f32(self.x);
        out.put_f32(self.y);
        out.put_f32(self.z);
    }

    fn read(input: &mut BlobReader<'_>) -> ModelResult<Self> {
        Ok(Self {
            x: input.get_f32()?,
            y: input.get_f32()?,
            z: input.get_f32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    handle: Handle,
    pub name: String,
    pub level: i32,
    pub target: Option<Handle>,
    pub position: Position,
}

impl Player {
    pub fn new(handle: Handle, name: &str) -> Self {
        Self {
            handle,
            name: name.into(),
            level: 1,
            target: None,
            position: Position::default(),
        }
    }
}

impl Entity for Player {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn save_fields(&self) -> Vec<FieldValue> {
        vec![
            self.name.clone().into_value(),
            self.level.into_value(),
            self.target.into_value(),
            self.position.to_value(),
        ]
    }
}

impl EntityType for Player {
    const TYPE_TAG: TypeTag = TypeTag::new(1);
    const NAME: &'static str = "Player";

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::of::<String>("name"),
            FieldSpec::of::<i32>("level"),
            FieldSpec::reference("target"),
            FieldSpec::blob::<Position>("position"),
        ])
    }

    fn load(record: EntityRecord) -> ModelResult<Self> {
        let (handle, mut fields) = FieldReader::open(Self::NAME, record);
        let player = Self {
            handle,
            name: fields.next()?,
            level: fields.next()?,
            target: fields.next()?,
            position: fields.blob()?,
        };
        fields.finish()?;
        Ok(player)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Monster {
    handle: Handle,
    pub hp: i32,
    pub kind: u8,
    pub target: Option<Handle>,
}

impl Monster {
    pub fn new(handle: Handle, hp: i32) -> Self {
        Self {
            handle,
            hp,
            kind: 0,
            target: None,
        }
    }
}

impl Entity for Monster {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn save_fields(&self) -> Vec<FieldValue> {
        vec![
            self.hp.into_value(),
            self.kind.into_value(),
            self.target.into_value(),
        ]
    }
}

impl EntityType for Monster {
    const TYPE_TAG: TypeTag = TypeTag::new(2);
    const NAME: &'static str = "Monster";

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::of::<i32>("hp"),
            FieldSpec::of::<u8>("kind"),
            FieldSpec::reference("target"),
        ])
    }

    fn load(record: EntityRecord) -> ModelResult<Self> {
        let (handle, mut fields) = FieldReader::open(Self::NAME, record);
        let monster = Self {
            handle,
            hp: fields.next()?,
            kind: fields.next()?,
            target: fields.next()?,
        };
        fields.finish()?;
        Ok(monster)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Party {
    handle: Handle,
    pub name: String,
    pub members: Vec<Handle>,
}

impl Party {
    pub fn new(handle: Handle, name: &str, members: Vec<Handle>) -> Self {
        Self {
            handle,
            name: name.into(),
            members,
        }
    }
}

impl Entity for Party {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn save_fields(&self) -> Vec<FieldValue> {
        vec![
            self.name.clone().into_value(),
            self.members.clone().into_value(),
        ]
    }
}

impl EntityType for Party {
    const TYPE_TAG: TypeTag = TypeTag::new(3);
    const NAME: &'static str = "Party";

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::of::<String>("name"),
            FieldSpec::of::<Vec<Handle>>("members"),
        ])
    }

    fn load(record: EntityRecord) -> ModelResult<Self> {
        let (handle, mut fields) = FieldReader::open(Self::NAME, record);
        let party = Self {
            handle,
            name: fields.next()?,
            members: fields.next()?,
        };
        fields.finish()?;
        Ok(party)
    }
}

/// One field of every kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Sampler {
    handle: Handle,
    pub flag: bool,
    pub letter: char,
    pub tiny: i8,
    pub byte: u8,
    pub short: i16,
    pub ushort: u16,
    pub int: i32,
    pub uint: u32,
    pub long: i64,
    pub ulong: u64,
    pub single: f32,
    pub double: f64,
    pub money: Decimal,
    pub text: String,
    pub spot: Position,
    pub link: Option<Handle>,
    pub grid: Vec<Vec<i32>>,
    pub path: Vec<Position>,
    pub words: Vec<String>,
}

impl Sampler {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            flag: true,
            letter: 'λ',
            tiny: -8,
            byte: 200,
            short: -1234,
            ushort: 60_000,
            int: -100_000,
            uint: 4_000_000_000,
            long: i64::MIN,
            ulong: u64::MAX,
            single: 1.5,
            double: -2.25e100,
            money: "-12345.6789".parse().unwrap(),
            text: "héllo, wörld".into(),
            spot: Position {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            },
            link: Some(handle),
            grid: vec![vec![1, 2], vec![], vec![3]],
            path: vec![
                Position::default(),
                Position {
                    x: -1.0,
                    y: 0.5,
                    z: 9.0,
                },
            ],
            words: vec!["a".into(), String::new(), "ccc".into()],
        }
    }
}

impl Entity for Sampler {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn save_fields(&self) -> Vec<FieldValue> {
        vec![
            self.flag.into_value(),
            self.letter.into_value(),
            self.tiny.into_value(),
            self.byte.into_value(),
            self.short.into_value(),
            self.ushort.into_value(),
            self.int.into_value(),
            self.uint.into_value(),
            self.long.into_value(),
            self.ulong.into_value(),
            self.single.into_value(),
            self.double.into_value(),
            self.money.into_value(),
            self.text.clone().into_value(),
            self.spot.to_value(),
            self.link.into_value(),
            self.grid.clone().into_value(),
            FieldValue::array(
                Position::kind(),
                self.path.iter().map(ValueBlob::to_value).collect(),
            ),
            self.words.clone().into_value(),
        ]
    }
}

impl EntityType for Sampler {
    const TYPE_TAG: TypeTag = TypeTag::new(4);
    const NAME: &'static str = "Sampler";

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::of::<bool>("flag"),
            FieldSpec::of::<char>("letter"),
            FieldSpec::of::<i8>("tiny"),
            FieldSpec::of::<u8>("byte"),
            FieldSpec::of::<i16>("short"),
            FieldSpec::of::<u16>("ushort"),
            FieldSpec::of::<i32>("int"),
            FieldSpec::of::<u32>("uint"),
            FieldSpec::of::<i64>("long"),
            FieldSpec::of::<u64>("ulong"),
            FieldSpec::of::<f32>("single"),
            FieldSpec::of::<f64>("double"),
            FieldSpec::of::<Decimal>("money"),
            FieldSpec::of::<String>("text"),
            FieldSpec::blob::<Position>("spot"),
            FieldSpec::reference("link"),
            FieldSpec::of::<Vec<Vec<i32>>>("grid"),
            FieldSpec::new("path", theta_types::FieldKind::array_of(Position::kind())),
            FieldSpec::of::<Vec<String>>("words"),
        ])
    }

    fn load(record: EntityRecord) -> ModelResult<Self> {
        let (handle, mut f) = FieldReader::open(Self::NAME, record);
        let sampler = Self {
            handle,
            flag: f.next()?,
            letter: f.next()?,
            tiny: f.next()?,
            byte: f.next()?,
            short: f.next()?,
            ushort: f.next()?,
            int: f.next()?,
            uint: f.next()?,
            long: f.next()?,
            ulong: f.next()?,
            single: f.next()?,
            double: f.next()?,
            money: f.next()?,
            text: f.next()?,
            spot: f.blob()?,
            link: f.next()?,
            grid: f.next()?,
            path: f.blobs()?,
            words: f.next()?,
        };
        f.finish()?;
        Ok(sampler)
    }
}

pub fn catalog() -> Arc<TypeCatalog> {
    Arc::new(
        TypeCatalog::builder()
            .register_blob::<Position>()
            .unwrap()
            .register::<Player>()
            .unwrap()
            .register::<Monster>()
            .unwrap()
            .register::<Party>()
            .unwrap()
            .register::<Sampler>()
            .unwrap()
            .build()
            .unwrap(),
    )
}
