//! A small demo world used by the smoke test and `inspect`.
//!
//! Every player targets a monster that targets it back, so a successful
//! round trip exercises cyclic references. One scratch monster is assigned
//! and freed last, leaving a freed slot in every save.

use anyhow::{Context, Result, bail, ensure};
use std::sync::Arc;
use theta_model::{
    BlobReader, BlobWriter, Entity, EntityType, FieldReader, FieldSpec, ModelResult, Schema,
    TypeCatalog, ValueBlob,
};
use theta_registry::{HandleRegistry, RegistryResult};
use theta_types::{BlobId, EntityRecord, Field, FieldValue, Handle, TypeTag};
use tracing::debug;

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
    #[must_use]
    pub fn new(handle: Handle, name: impl Into<String>) -> Self {
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
    #[must_use]
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
    #[must_use]
    pub fn new(handle: Handle, name: impl Into<String>, members: Vec<Handle>) -> Self {
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

/// The catalog of demo types.
pub fn demo_catalog() -> ModelResult<Arc<TypeCatalog>> {
    let catalog = TypeCatalog::builder()
        .register_blob::<Position>()?
        .register::<Player>()?
        .register::<Monster>()?
        .register::<Party>()?
        .build()?;
    Ok(Arc::new(catalog))
}

/// Handles of a built demo world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    pub players: Vec<Handle>,
    pub monsters: Vec<Handle>,
    pub party: Handle,
}

/// Creates `count` player/monster pairs that target each other and a party
/// of all players. The entities stay in `registry`.
pub fn build_world(registry: &HandleRegistry, count: usize) -> RegistryResult<World> {
    let mut players = Vec::with_capacity(count);
    let mut monsters = Vec::with_capacity(count);

    for i in 0..count {
        let player = registry.assign(|h| Player::new(h, format!("player-{i}")))?;
        let monster =
            registry.assign(|h| Monster::new(h, i32::try_from(10 * (i + 1)).unwrap_or(i32::MAX)))?;
        {
            let mut p = player.write();
            p.level = i32::try_from(i + 1).unwrap_or(i32::MAX);
            p.target = Some(monster.handle());
            p.position = Position {
                x: i as f32,
                y: 0.0,
                z: -(i as f32),
            };
        }
        {
            let mut m = monster.write();
            m.kind = (i % 4) as u8;
            m.target = Some(player.handle());
        }
        players.push(player.detach());
        monsters.push(monster.detach());
    }

    let party = registry
        .assign(|h| Party::new(h, "demo", players.clone()))?
        .detach();
    registry.assign(|h| Monster::new(h, 0))?.release()?;
    debug!("Built demo world with {} pairs", count);

    Ok(World {
        players,
        monsters,
        party,
    })
}

/// Checks that every pair still targets each other and that the party
/// lists every player. Returns the number of verified cycles.
pub fn verify_world(registry: &HandleRegistry, world: &World) -> Result<usize> {
    let mut cycles = 0;
    for (&player, &monster) in world.players.iter().zip(&world.monsters) {
        let p = registry
            .get::<Player>(player)
            .with_context(|| format!("player {player} missing"))?;
        let target = p.read().target;
        ensure!(
            target == Some(monster),
            "player {player} targets {target:?}, expected {monster}"
        );
        let m = registry
            .get::<Monster>(monster)
            .with_context(|| format!("monster {monster} missing"))?;
        let back = m.read().target;
        if back != Some(player) {
            bail!("monster {monster} targets {back:?}, expected {player}");
        }
        cycles += 1;
    }

    let party = registry
        .get::<Party>(world.party)
        .with_context(|| format!("party {} missing", world.party))?;
    ensure!(
        party.read().members == world.players,
        "party {} members changed",
        world.party
    );
    Ok(cycles)
}
