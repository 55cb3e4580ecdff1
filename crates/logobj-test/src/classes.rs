//! Sample classes
//!
//! - [`QueueState`]: persisted queue settings, implements every slot
//! - [`Marker`]: bare class with only constructor and destructor

use std::cell::Cell;

use logobj_core::{
    impl_object, ClassDescriptor, ClassId, CountedStr, Method, ObjBase, ObjError, ObjResult,
    Object, PropValue, Property, Strm, SyslogTime, Value,
};
use logobj_runtime::{ObjConfig, ObjRuntime, ObjRuntimeBuilder};
use logobj_wire::RecordWriter;

pub const QUEUE_CLASS: ClassId = ClassId::new_const(10);
pub const MARKER_CLASS: ClassId = ClassId::new_const(11);

/// Wire version of [`QueueState`] records
pub const QUEUE_VERSION: i32 = 3;

pub const PROP_NAME: &str = "pszName";
pub const PROP_SIZE: &str = "iQueueSize";
pub const PROP_MAX_SIZE: &str = "iMaxQueueSize";
pub const PROP_DISCARD_SEVERITY: &str = "iDiscardSeverity";
pub const PROP_LAST_ENQUEUE: &str = "tLastEnq";
pub const PROP_SPOOL_DIR: &str = "cstrSpoolDir";

thread_local! {
    static DESTROYED: Cell<usize> = Cell::new(0);
}

/// Sample objects destroyed on the calling thread so far
pub fn destroyed_on_this_thread() -> usize {
    DESTROYED.with(|d| d.get())
}

fn count_destruction() {
    DESTROYED.with(|d| d.set(d.get() + 1));
}

/// Persisted settings of a disk assisted queue
#[derive(Debug, Clone)]
pub struct QueueState {
    base: ObjBase,
    pub name: String,
    pub size: i64,
    pub max_size: i32,
    pub discard_severity: i16,
    pub last_enqueue: Option<SyslogTime>,
    pub spool_dir: Option<CountedStr>,
    /// Set by the construction finalizer
    pub finalized: bool,
}

impl_object!(QueueState);

impl QueueState {
    pub fn new(name: &str) -> Self {
        QueueState {
            base: ObjBase::new(&queue_class()),
            name: name.to_string(),
            size: 0,
            max_size: 10_000,
            discard_severity: 8,
            last_enqueue: None,
            spool_dir: None,
            finalized: false,
        }
    }

    /// Fields that travel over the wire, for comparisons
    pub fn same_wire_state(&self, other: &QueueState) -> bool {
        self.name == other.name
            && self.size == other.size
            && self.max_size == other.max_size
            && self.discard_severity == other.discard_severity
            && self.last_enqueue == other.last_enqueue
            && self.spool_dir == other.spool_dir
    }
}

fn as_queue(obj: &dyn Object) -> ObjResult<&QueueState> {
    obj.downcast_ref::<QueueState>()
        .ok_or(ObjError::ClassNotRegistered(QUEUE_CLASS))
}

fn as_queue_mut(obj: &mut dyn Object) -> ObjResult<&mut QueueState> {
    obj.downcast_mut::<QueueState>()
        .ok_or(ObjError::ClassNotRegistered(QUEUE_CLASS))
}

pub fn queue_class() -> ClassDescriptor {
    ClassDescriptor::define(QUEUE_CLASS, "queue", QUEUE_VERSION, queue_construct, queue_destruct)
        .with_method(Method::Serialize(queue_serialize))
        .with_method(Method::SetProperty(queue_set_property))
        .with_method(Method::ConstructionFinalizer(queue_finalize))
        .with_method(Method::GetSeverity(queue_severity))
        .with_method(Method::DebugPrint(queue_debug_print))
}

fn queue_construct() -> ObjResult<Box<dyn Object>> {
    Ok(Box::new(QueueState::new("")))
}

fn queue_destruct(mut obj: Box<dyn Object>) -> ObjResult<()> {
    as_queue_mut(obj.as_mut())?;
    obj.base_mut().destruct_self();
    count_destruction();
    Ok(())
}

/// Writes the queue's settings; unset optional fields are omitted
fn queue_serialize(obj: &dyn Object, strm: &mut dyn Strm) -> ObjResult<()> {
    let queue = as_queue(obj)?;

    let mut writer = RecordWriter::begin(strm, obj)?;
    writer.prop(PROP_NAME, queue.name.as_str())?;
    writer.prop(PROP_SIZE, PropValue::Int64(queue.size))?;
    writer.prop(PROP_MAX_SIZE, queue.max_size)?;
    writer.prop(PROP_DISCARD_SEVERITY, queue.discard_severity)?;
    writer.prop_opt(PROP_LAST_ENQUEUE, queue.last_enqueue.as_ref().map(PropValue::from))?;
    writer.prop_opt(PROP_SPOOL_DIR, queue.spool_dir.as_ref().map(PropValue::from))?;
    writer.end()
}

fn type_mismatch() -> ObjError {
    ObjError::InvalidPropertyFrame("property type does not match")
}

fn queue_set_property(obj: &mut dyn Object, prop: &Property) -> ObjResult<()> {
    let queue = as_queue_mut(obj)?;

    match (prop.name(), &prop.value) {
        (PROP_NAME, Value::Str(s)) => queue.name = s.to_string_lossy(),
        (PROP_SIZE, Value::Number(n)) => queue.size = *n,
        (PROP_MAX_SIZE, Value::Number(n)) => {
            queue.max_size = i32::try_from(*n).map_err(|_| ObjError::InvalidNumber)?
        }
        (PROP_DISCARD_SEVERITY, Value::Number(n)) => {
            queue.discard_severity = i16::try_from(*n).map_err(|_| ObjError::InvalidNumber)?
        }
        (PROP_LAST_ENQUEUE, Value::SyslogTime(t)) => queue.last_enqueue = Some(*t),
        (PROP_SPOOL_DIR, Value::Str(s)) => queue.spool_dir = Some(s.clone()),
        (
            PROP_NAME | PROP_SIZE | PROP_MAX_SIZE | PROP_DISCARD_SEVERITY | PROP_LAST_ENQUEUE
            | PROP_SPOOL_DIR,
            _,
        ) => return Err(type_mismatch()),
        (other, _) => tracing::debug!(property = other, "ignoring unknown queue property"),
    }
    Ok(())
}

/// Names the instance after the queue once all properties are in
fn queue_finalize(obj: &mut dyn Object) -> ObjResult<()> {
    let queue = as_queue_mut(obj)?;
    if queue.max_size < 0 {
        return Err(ObjError::InvalidNumber);
    }
    if !queue.name.is_empty() {
        let name = queue.name.clone();
        queue.base.set_name(&name)?;
    }
    queue.finalized = true;
    Ok(())
}

fn queue_severity(obj: &dyn Object) -> ObjResult<i32> {
    Ok(i32::from(as_queue(obj)?.discard_severity))
}

fn queue_debug_print(obj: &dyn Object) -> ObjResult<()> {
    let queue = as_queue(obj)?;
    tracing::debug!(
        name = %queue.name,
        size = queue.size,
        max_size = queue.max_size,
        "queue state"
    );
    Ok(())
}

/// Class with nothing but the mandatory slots
#[derive(Debug)]
pub struct Marker {
    base: ObjBase,
}

impl_object!(Marker);

pub fn marker_class() -> ClassDescriptor {
    ClassDescriptor::define(MARKER_CLASS, "marker", 1, marker_construct, marker_destruct)
}

fn marker_construct() -> ObjResult<Box<dyn Object>> {
    Ok(Box::new(Marker {
        base: ObjBase::new(&marker_class()),
    }))
}

fn marker_destruct(mut obj: Box<dyn Object>) -> ObjResult<()> {
    obj.base_mut().destruct_self();
    count_destruction();
    Ok(())
}

/// Register every sample class
pub fn register_samples(builder: &mut ObjRuntimeBuilder) -> ObjResult<()> {
    builder.define(queue_class())?;
    builder.define(marker_class())?;
    Ok(())
}

/// Runtime with the sample classes registered
pub fn sample_runtime(config: ObjConfig) -> ObjResult<ObjRuntime> {
    let mut builder = ObjRuntime::builder(config)?;
    register_samples(&mut builder)?;
    builder.build()
}
