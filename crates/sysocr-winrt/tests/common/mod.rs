//! An in-process stand-in for the Windows Runtime.
//!
//! Objects are real vtable-dispatched objects: each supported interface is a
//! separate view (`{vtable, object}`) over one shared reference count, so
//! identity and capability queries behave like the native ones. Memory of
//! released objects is never freed, which lets the [`Ledger`] count
//! over-releases and calls on dead objects instead of crashing.

#![allow(dead_code)]

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashSet;
use std::ffi::c_void;
use std::mem::ManuallyDrop;
use std::ptr;
use std::rc::Rc;

use sysocr_winrt::abi::vtbl::*;
use sysocr_winrt::abi::{GUID, HRESULT, Interface, NativeHandle, RawHString, RawPtr, hresult};
use sysocr_winrt::activation::ActivationFactory;
use sysocr_winrt::aggregate::Rect;
use sysocr_winrt::async_op::AsyncInfo;
use sysocr_winrt::interfaces::globalization::LANGUAGE;
use sysocr_winrt::interfaces::imaging::BITMAP_DECODER;
use sysocr_winrt::interfaces::ocr::OCR_ENGINE;
use sysocr_winrt::interfaces::streams::{DATA_WRITER, IN_MEMORY_RANDOM_ACCESS_STREAM};
use sysocr_winrt::interfaces::{
    BitmapDecoderStatics, BitmapFrameWithSoftwareBitmap, DataWriter, DataWriterFactory, Language,
    LanguageFactory, OcrEngine, OcrEngineStatics, OcrLine, OcrResult, OcrWord, OutputStream,
    RandomAccessStream, SoftwareBitmap,
};
use sysocr_winrt::runtime::Runtime;

const IID_FAKE_OPERATION: GUID = GUID::from_u128(0x0fa4e000_0000_4000_8000_000000000001);
const IID_FAKE_DECODER: GUID = GUID::from_u128(0x0fa4e000_0000_4000_8000_000000000002);
const IID_FAKE_VECTOR: GUID = GUID::from_u128(0x0fa4e000_0000_4000_8000_000000000003);

const IMAGE_MAGIC: &[u8; 8] = b"FAKEIMG1";

/// Bytes the fake decoder accepts: a magic tag followed by the dimensions
pub fn fake_image(width: i32, height: i32) -> Vec<u8> {
    let mut bytes = IMAGE_MAGIC.to_vec();
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes
}

fn parse_image(bytes: &[u8]) -> Option<(i32, i32)> {
    let rest = bytes.strip_prefix(IMAGE_MAGIC.as_slice())?;
    let width = i32::from_le_bytes(rest.get(0..4)?.try_into().ok()?);
    let height = i32::from_le_bytes(rest.get(4..8)?.try_into().ok()?);
    Some((width, height))
}

/// The async operations the pipeline waits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Store,
    Flush,
    Decode,
    Bitmap,
    Recognize,
}

/// How a scripted operation behaves when polled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Plan {
    /// `Started` for this many polls, then `Completed`
    Complete { after_polls: u32 },
    Fail(HRESULT),
    Never,
    Cancel,
}

impl Default for Plan {
    fn default() -> Self {
        Plan::Complete { after_polls: 1 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeLine {
    pub text: String,
    pub words: Vec<Rect>,
}

impl FakeLine {
    pub fn new(text: &str, words: &[(f32, f32, f32, f32)]) -> Self {
        Self {
            text: text.to_string(),
            words: words
                .iter()
                .map(|&(x, y, width, height)| Rect { x, y, width, height })
                .collect(),
        }
    }
}

/// What the fake runtime recognizes and where it fails
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub lines: Vec<FakeLine>,
    /// Languages with an installed recognizer
    pub installed: Vec<String>,
    pub profile_language: Option<String>,
    pub missing_classes: Vec<&'static str>,
    pub plans: Vec<(OpKind, Plan)>,
    pub init_error: Option<HRESULT>,
    pub decoder_without_frame: bool,
}

impl Scenario {
    /// English recognizer installed and set as the profile language
    pub fn english() -> Self {
        Self {
            installed: vec!["en-US".to_string()],
            profile_language: Some("en-US".to_string()),
            ..Self::default()
        }
    }

    pub fn with_lines(mut self, lines: Vec<FakeLine>) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_plan(mut self, op: OpKind, plan: Plan) -> Self {
        self.plans.push((op, plan));
        self
    }

    fn plan(&self, op: OpKind) -> Plan {
        self.plans
            .iter()
            .rev()
            .find(|(kind, _)| *kind == op)
            .map(|(_, plan)| *plan)
            .unwrap_or_default()
    }
}

/// Everything the fake runtime observed
#[derive(Debug, Default)]
pub struct Ledger {
    created_objects: Cell<usize>,
    live_objects: Cell<usize>,
    over_releases: Cell<usize>,
    use_after_release: Cell<usize>,
    live_strings: RefCell<HashSet<usize>>,
    string_over_frees: Cell<usize>,
    cancels: Cell<usize>,
    inits: Cell<usize>,
    activations: RefCell<Vec<String>>,
    languages_tried: RefCell<Vec<String>>,
    engines: RefCell<Vec<String>>,
}

impl Ledger {
    pub fn created_objects(&self) -> usize {
        self.created_objects.get()
    }

    pub fn live_objects(&self) -> usize {
        self.live_objects.get()
    }

    pub fn over_releases(&self) -> usize {
        self.over_releases.get()
    }

    pub fn use_after_release(&self) -> usize {
        self.use_after_release.get()
    }

    pub fn live_strings(&self) -> usize {
        self.live_strings.borrow().len()
    }

    pub fn string_over_frees(&self) -> usize {
        self.string_over_frees.get()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.get()
    }

    pub fn inits(&self) -> usize {
        self.inits.get()
    }

    pub fn activations(&self) -> Vec<String> {
        self.activations.borrow().clone()
    }

    /// Tags passed to the language factory, in call order
    pub fn languages_tried(&self) -> Vec<String> {
        self.languages_tried.borrow().clone()
    }

    /// Recognizer languages of every engine created
    pub fn engines(&self) -> Vec<String> {
        self.engines.borrow().clone()
    }
}

struct Shared {
    scenario: Scenario,
    ledger: Ledger,
}

impl Shared {
    fn create_string(&self, text: &str) -> RawHString {
        let utf16: Vec<u16> = text.encode_utf16().collect();
        if utf16.is_empty() {
            return ptr::null_mut();
        }
        let raw = Box::into_raw(Box::new(utf16));
        self.ledger.live_strings.borrow_mut().insert(raw as usize);
        raw.cast()
    }

    fn read_string(&self, raw: RawHString) -> String {
        if raw.is_null() {
            return String::new();
        }
        if !self.ledger.live_strings.borrow().contains(&(raw as usize)) {
            self.ledger.use_after_release.set(self.ledger.use_after_release.get() + 1);
            return String::new();
        }
        let utf16 = unsafe { &*(raw as *const Vec<u16>) };
        String::from_utf16_lossy(utf16)
    }
}

pub struct FakeRuntime {
    shared: Rc<Shared>,
}

impl FakeRuntime {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            shared: Rc::new(Shared {
                scenario,
                ledger: Ledger::default(),
            }),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.shared.ledger
    }

    /// No native object or string outlived the run, and none was released
    /// or used once too often
    pub fn assert_clean(&self) {
        let ledger = self.ledger();
        assert_eq!(ledger.live_objects(), 0, "native objects still referenced");
        assert_eq!(ledger.over_releases(), 0, "native objects released too often");
        assert_eq!(ledger.use_after_release(), 0, "native objects used after release");
        assert_eq!(ledger.live_strings(), 0, "native strings leaked");
        assert_eq!(ledger.string_over_frees(), 0, "native strings freed twice");
    }

    /// A fresh in-memory stream, as the runtime would activate it
    pub fn new_stream(&self) -> NativeHandle {
        let raw = new_object(&self.shared, Kind::Stream(Stream::default()));
        unsafe { NativeHandle::from_raw(raw) }.expect("fresh object")
    }
}

impl Runtime for FakeRuntime {
    fn initialize(&self) -> Result<(), HRESULT> {
        let ledger = &self.shared.ledger;
        ledger.inits.set(ledger.inits.get() + 1);
        match self.shared.scenario.init_error {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    fn create_string(&self, utf16: &[u16]) -> Result<RawHString, HRESULT> {
        Ok(self.shared.create_string(&String::from_utf16_lossy(utf16)))
    }

    unsafe fn delete_string(&self, string: RawHString) {
        let removed = self.shared.ledger.live_strings.borrow_mut().remove(&(string as usize));
        if removed {
            drop(unsafe { Box::from_raw(string as *mut Vec<u16>) });
        } else {
            let ledger = &self.shared.ledger;
            ledger.string_over_frees.set(ledger.string_over_frees.get() + 1);
        }
    }

    unsafe fn string_to_utf16(&self, string: RawHString) -> Vec<u16> {
        self.shared.read_string(string).encode_utf16().collect()
    }

    unsafe fn activation_factory(&self, class: RawHString, iid: &GUID) -> Result<RawPtr, HRESULT> {
        let name = self.shared.read_string(class);
        self.shared.ledger.activations.borrow_mut().push(name.clone());
        if self.shared.scenario.missing_classes.iter().any(|missing| *missing == name) {
            return Err(hresult::REGDB_E_CLASSNOTREG);
        }

        let kind = match name.as_str() {
            IN_MEMORY_RANDOM_ACCESS_STREAM => Kind::StreamFactory,
            DATA_WRITER => Kind::WriterFactory,
            BITMAP_DECODER => Kind::DecoderStatics,
            OCR_ENGINE => Kind::EngineStatics,
            LANGUAGE => Kind::LanguageFactory,
            _ => return Err(hresult::REGDB_E_CLASSNOTREG),
        };

        let factory = unsafe { NativeHandle::from_raw(new_object(&self.shared, kind)) }.ok_or(hresult::E_POINTER)?;
        let view = factory.query(iid)?;
        Ok(view.into_raw())
    }
}

#[derive(Default)]
struct Stream {
    data: RefCell<Vec<u8>>,
    position: Cell<u64>,
}

impl Stream {
    fn write(&self, bytes: &[u8]) {
        let mut data = self.data.borrow_mut();
        data.truncate(self.position.get() as usize);
        data.extend_from_slice(bytes);
        self.position.set(data.len() as u64);
    }

    fn remaining(&self) -> Vec<u8> {
        let data = self.data.borrow();
        let start = (self.position.get() as usize).min(data.len());
        data[start..].to_vec()
    }
}

struct Writer {
    buffer: RefCell<Vec<u8>>,
    stream: RefCell<Option<NativeHandle>>,
}

enum Value {
    U32(u32),
    Bool(bool),
    Object(NativeHandle),
}

struct Operation {
    plan: Plan,
    polls: Cell<u32>,
    canceled: Cell<bool>,
    completed: Cell<bool>,
    result: RefCell<Option<Value>>,
}

enum Item {
    Line(FakeLine),
    Word(Rect),
}

enum Kind {
    StreamFactory,
    WriterFactory,
    DecoderStatics,
    EngineStatics,
    LanguageFactory,
    Stream(Stream),
    Writer(Writer),
    Operation(Operation),
    Decoder { width: i32, height: i32 },
    Bitmap { width: i32, height: i32 },
    Engine { language: String },
    Language { tag: String },
    Result { lines: Vec<FakeLine> },
    Vector(Vec<Item>),
    Line(FakeLine),
    Word(Rect),
}

fn vt<T>(vtable: &'static T) -> *const c_void {
    ptr::from_ref(vtable).cast()
}

impl Kind {
    fn interfaces(&self, scenario: &Scenario) -> Vec<(GUID, *const c_void)> {
        match self {
            Kind::StreamFactory => vec![(ActivationFactory::IID, vt(&STREAM_FACTORY_VTBL))],
            Kind::WriterFactory => vec![(DataWriterFactory::IID, vt(&WRITER_FACTORY_VTBL))],
            Kind::DecoderStatics => vec![(BitmapDecoderStatics::IID, vt(&DECODER_STATICS_VTBL))],
            Kind::EngineStatics => vec![(OcrEngineStatics::IID, vt(&ENGINE_STATICS_VTBL))],
            Kind::LanguageFactory => vec![(LanguageFactory::IID, vt(&LANGUAGE_FACTORY_VTBL))],
            Kind::Stream(_) => vec![
                (RandomAccessStream::IID, vt(&STREAM_VTBL)),
                (OutputStream::IID, vt(&OUTPUT_STREAM_VTBL)),
            ],
            Kind::Writer(_) => vec![(DataWriter::IID, vt(&WRITER_VTBL))],
            Kind::Operation(_) => vec![
                (IID_FAKE_OPERATION, vt(&OPERATION_VTBL)),
                (AsyncInfo::IID, vt(&ASYNC_INFO_VTBL)),
            ],
            Kind::Decoder { .. } => {
                let mut views = vec![(IID_FAKE_DECODER, vt(&PLAIN_VTBL))];
                if !scenario.decoder_without_frame {
                    views.push((BitmapFrameWithSoftwareBitmap::IID, vt(&FRAME_VTBL)));
                }
                views
            }
            Kind::Bitmap { .. } => vec![(SoftwareBitmap::IID, vt(&BITMAP_VTBL))],
            Kind::Engine { .. } => vec![(OcrEngine::IID, vt(&ENGINE_VTBL))],
            Kind::Language { .. } => vec![(Language::IID, vt(&LANGUAGE_VTBL))],
            Kind::Result { .. } => vec![(OcrResult::IID, vt(&RESULT_VTBL))],
            Kind::Vector(_) => vec![(IID_FAKE_VECTOR, vt(&VECTOR_VTBL))],
            Kind::Line(_) => vec![(OcrLine::IID, vt(&LINE_VTBL))],
            Kind::Word(_) => vec![(OcrWord::IID, vt(&WORD_VTBL))],
        }
    }
}

#[repr(C)]
struct View {
    vtable: *const c_void,
    object: *const Object,
    iid: GUID,
}

struct Object {
    refs: Cell<u32>,
    shared: Rc<Shared>,
    kind: RefCell<Option<Kind>>,
    views: OnceCell<Vec<Box<View>>>,
}

impl Object {
    fn views(&self) -> &[Box<View>] {
        self.views.get().map(Vec::as_slice).unwrap_or_default()
    }

    fn view(&self, iid: &GUID) -> Option<RawPtr> {
        let views = self.views();
        let view = if *iid == IID_IUNKNOWN {
            views.first()
        } else {
            views.iter().find(|view| view.iid == *iid)
        }?;
        Some(ptr::from_ref::<View>(view).cast_mut().cast())
    }

    fn ledger(&self) -> &Ledger {
        &self.shared.ledger
    }
}

/// Returns the primary view, holding one reference
fn new_object(shared: &Rc<Shared>, kind: Kind) -> RawPtr {
    let interfaces = kind.interfaces(&shared.scenario);
    let object: &'static Object = Box::leak(Box::new(Object {
        refs: Cell::new(1),
        shared: Rc::clone(shared),
        kind: RefCell::new(Some(kind)),
        views: OnceCell::new(),
    }));
    let views = interfaces
        .into_iter()
        .map(|(iid, vtable)| Box::new(View { vtable, object, iid }))
        .collect();
    let _ = object.views.set(views);

    let ledger = &shared.ledger;
    ledger.created_objects.set(ledger.created_objects.get() + 1);
    ledger.live_objects.set(ledger.live_objects.get() + 1);

    ptr::from_ref::<View>(&object.views()[0]).cast_mut().cast()
}

fn new_handle(shared: &Rc<Shared>, kind: Kind) -> NativeHandle {
    unsafe { NativeHandle::from_raw(new_object(shared, kind)) }.expect("fresh object")
}

fn new_operation(shared: &Rc<Shared>, op: OpKind, result: Option<Value>) -> RawPtr {
    let plan = match result {
        Some(_) => shared.scenario.plan(op),
        None => Plan::Fail(hresult::WINCODEC_ERR_COMPONENTNOTFOUND),
    };
    new_operation_with(shared, plan, result)
}

fn new_operation_with(shared: &Rc<Shared>, plan: Plan, result: Option<Value>) -> RawPtr {
    new_object(
        shared,
        Kind::Operation(Operation {
            plan,
            polls: Cell::new(0),
            canceled: Cell::new(false),
            completed: Cell::new(false),
            result: RefCell::new(result),
        }),
    )
}

unsafe fn view_of<'a>(this: RawPtr) -> &'a View {
    unsafe { &*(this as *const View) }
}

unsafe fn object_of<'a>(this: RawPtr) -> &'a Object {
    unsafe { &*view_of(this).object }
}

/// Run `f` against a live object, turning calls on released ones into errors
fn call(this: RawPtr, f: impl FnOnce(&Object, &Kind) -> Result<(), HRESULT>) -> HRESULT {
    let object = unsafe { object_of(this) };
    let kind = object.kind.borrow();
    let Some(kind) = kind.as_ref() else {
        let ledger = object.ledger();
        ledger.use_after_release.set(ledger.use_after_release.get() + 1);
        return hresult::E_UNEXPECTED;
    };
    match f(object, kind) {
        Ok(()) => hresult::S_OK,
        Err(code) => code,
    }
}

/// The argument must be the `iid` view of a live object
fn argument<'a>(arg: RawPtr, iid: &GUID) -> Result<&'a Object, HRESULT> {
    if arg.is_null() {
        return Err(hresult::E_POINTER);
    }
    if unsafe { view_of(arg) }.iid != *iid {
        return Err(hresult::E_INVALIDARG);
    }
    Ok(unsafe { object_of(arg) })
}

unsafe extern "system" fn query_interface(this: RawPtr, iid: *const GUID, out: *mut RawPtr) -> HRESULT {
    let object = unsafe { object_of(this) };
    match object.view(unsafe { &*iid }) {
        Some(view) => {
            unsafe { add_ref(this) };
            unsafe { *out = view };
            hresult::S_OK
        }
        None => {
            unsafe { *out = ptr::null_mut() };
            hresult::E_NOINTERFACE
        }
    }
}

unsafe extern "system" fn add_ref(this: RawPtr) -> u32 {
    let object = unsafe { object_of(this) };
    let refs = object.refs.get();
    if refs == 0 {
        let ledger = object.ledger();
        ledger.use_after_release.set(ledger.use_after_release.get() + 1);
        return 0;
    }
    object.refs.set(refs + 1);
    refs + 1
}

unsafe extern "system" fn release(this: RawPtr) -> u32 {
    let object = unsafe { object_of(this) };
    let refs = object.refs.get();
    if refs == 0 {
        let ledger = object.ledger();
        ledger.over_releases.set(ledger.over_releases.get() + 1);
        return 0;
    }
    object.refs.set(refs - 1);
    if refs == 1 {
        let ledger = object.ledger();
        ledger.live_objects.set(ledger.live_objects.get() - 1);
        // Releases whatever the object itself holds.
        let kind = object.kind.borrow_mut().take();
        drop(kind);
    }
    refs - 1
}

const UNKNOWN: IUnknownVtbl = IUnknownVtbl {
    query_interface,
    add_ref,
    release,
};

const INSPECTABLE: IInspectableVtbl = IInspectableVtbl {
    base: UNKNOWN,
    get_iids: 0,
    get_runtime_class_name: 0,
    get_trust_level: 0,
};

static PLAIN_VTBL: IInspectableVtbl = INSPECTABLE;

static STREAM_FACTORY_VTBL: IActivationFactoryVtbl = IActivationFactoryVtbl {
    base: INSPECTABLE,
    activate_instance: stream_factory_activate,
};

unsafe extern "system" fn stream_factory_activate(this: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, _| {
        unsafe { *out = new_object(&object.shared, Kind::Stream(Stream::default())) };
        Ok(())
    })
}

static STREAM_VTBL: IRandomAccessStreamVtbl = IRandomAccessStreamVtbl {
    base: INSPECTABLE,
    size: 0,
    put_size: 0,
    get_input_stream_at: 0,
    get_output_stream_at: 0,
    position: stream_position,
    seek: stream_seek,
    clone_stream: 0,
    can_read: 0,
    can_write: 0,
};

static OUTPUT_STREAM_VTBL: IOutputStreamVtbl = IOutputStreamVtbl {
    base: INSPECTABLE,
    write_async: 0,
    flush_async: 0,
};

unsafe extern "system" fn stream_position(this: RawPtr, out: *mut u64) -> HRESULT {
    call(this, |_, kind| match kind {
        Kind::Stream(stream) => {
            unsafe { *out = stream.position.get() };
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

unsafe extern "system" fn stream_seek(this: RawPtr, position: u64) -> HRESULT {
    call(this, |_, kind| match kind {
        Kind::Stream(stream) => {
            stream.position.set(position);
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

static WRITER_FACTORY_VTBL: IDataWriterFactoryVtbl = IDataWriterFactoryVtbl {
    base: INSPECTABLE,
    create_data_writer: writer_factory_create,
};

unsafe extern "system" fn writer_factory_create(this: RawPtr, output: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, _| {
        argument(output, &OutputStream::IID)?;
        let borrowed = ManuallyDrop::new(unsafe { NativeHandle::from_raw(output) }.ok_or(hresult::E_POINTER)?);
        let writer = Writer {
            buffer: RefCell::new(Vec::new()),
            stream: RefCell::new(Some((*borrowed).clone())),
        };
        unsafe { *out = new_object(&object.shared, Kind::Writer(writer)) };
        Ok(())
    })
}

static WRITER_VTBL: IDataWriterVtbl = IDataWriterVtbl {
    base: INSPECTABLE,
    unstored_buffer_length: 0,
    unicode_encoding: 0,
    put_unicode_encoding: 0,
    byte_order: 0,
    put_byte_order: 0,
    write_byte: 0,
    write_bytes: writer_write_bytes,
    write_other: [0; 16],
    store_async: writer_store,
    flush_async: writer_flush,
    detach_buffer: 0,
    detach_stream: writer_detach_stream,
};

fn with_writer(this: RawPtr, f: impl FnOnce(&Object, &Writer) -> Result<(), HRESULT>) -> HRESULT {
    call(this, |object, kind| match kind {
        Kind::Writer(writer) => f(object, writer),
        _ => Err(hresult::E_UNEXPECTED),
    })
}

unsafe extern "system" fn writer_write_bytes(this: RawPtr, len: u32, data: *const u8) -> HRESULT {
    with_writer(this, |_, writer| {
        let bytes = unsafe { std::slice::from_raw_parts(data, len as usize) };
        writer.buffer.borrow_mut().extend_from_slice(bytes);
        Ok(())
    })
}

unsafe extern "system" fn writer_store(this: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    with_writer(this, |object, writer| {
        let stream = writer.stream.borrow();
        let stream = stream.as_ref().ok_or(hresult::E_ILLEGAL_METHOD_CALL)?;
        let bytes = std::mem::take(&mut *writer.buffer.borrow_mut());
        let stream_object = unsafe { object_of(stream.as_raw()) };
        match stream_object.kind.borrow().as_ref() {
            Some(Kind::Stream(stream)) => stream.write(&bytes),
            _ => return Err(hresult::E_UNEXPECTED),
        }
        let stored = Value::U32(bytes.len() as u32);
        unsafe { *out = new_operation(&object.shared, OpKind::Store, Some(stored)) };
        Ok(())
    })
}

unsafe extern "system" fn writer_flush(this: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    with_writer(this, |object, _| {
        unsafe { *out = new_operation(&object.shared, OpKind::Flush, Some(Value::Bool(true))) };
        Ok(())
    })
}

unsafe extern "system" fn writer_detach_stream(this: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    with_writer(this, |_, writer| {
        if let Some(stream) = writer.stream.borrow_mut().take() {
            unsafe { *out = stream.into_raw() };
        }
        Ok(())
    })
}

static OPERATION_VTBL: IAsyncOperationVtbl = IAsyncOperationVtbl {
    base: INSPECTABLE,
    put_completed: 0,
    get_completed: 0,
    get_results: operation_results,
};

static ASYNC_INFO_VTBL: IAsyncInfoVtbl = IAsyncInfoVtbl {
    base: INSPECTABLE,
    id: 0,
    status: operation_status,
    error_code: operation_error_code,
    cancel: operation_cancel,
    close: operation_close,
};

fn with_operation(this: RawPtr, f: impl FnOnce(&Object, &Operation) -> Result<(), HRESULT>) -> HRESULT {
    call(this, |object, kind| match kind {
        Kind::Operation(op) => f(object, op),
        _ => Err(hresult::E_UNEXPECTED),
    })
}

unsafe extern "system" fn operation_status(this: RawPtr, out: *mut i32) -> HRESULT {
    with_operation(this, |_, op| {
        let polls = op.polls.get() + 1;
        op.polls.set(polls);
        let status = if op.canceled.get() {
            2
        } else {
            match op.plan {
                Plan::Complete { after_polls } if polls > after_polls => {
                    op.completed.set(true);
                    1
                }
                Plan::Complete { .. } | Plan::Never => 0,
                Plan::Cancel => 2,
                Plan::Fail(_) => 3,
            }
        };
        unsafe { *out = status };
        Ok(())
    })
}

unsafe extern "system" fn operation_error_code(this: RawPtr, out: *mut HRESULT) -> HRESULT {
    with_operation(this, |_, op| {
        let code = match op.plan {
            Plan::Fail(code) => code,
            _ => hresult::S_OK,
        };
        unsafe { *out = code };
        Ok(())
    })
}

unsafe extern "system" fn operation_cancel(this: RawPtr) -> HRESULT {
    with_operation(this, |object, op| {
        op.canceled.set(true);
        let ledger = object.ledger();
        ledger.cancels.set(ledger.cancels.get() + 1);
        Ok(())
    })
}

unsafe extern "system" fn operation_close(this: RawPtr) -> HRESULT {
    with_operation(this, |_, _| Ok(()))
}

unsafe extern "system" fn operation_results(this: RawPtr, out: *mut c_void) -> HRESULT {
    with_operation(this, |_, op| {
        if !op.completed.get() {
            return Err(hresult::E_ILLEGAL_METHOD_CALL);
        }
        match op.result.borrow_mut().take() {
            Some(Value::U32(value)) => unsafe { *(out as *mut u32) = value },
            Some(Value::Bool(value)) => unsafe { *(out as *mut u8) = u8::from(value) },
            Some(Value::Object(handle)) => unsafe { *(out as *mut RawPtr) = handle.into_raw() },
            None => return Err(hresult::E_ILLEGAL_METHOD_CALL),
        }
        Ok(())
    })
}

static DECODER_STATICS_VTBL: IBitmapDecoderStaticsVtbl = IBitmapDecoderStaticsVtbl {
    base: INSPECTABLE,
    decoder_ids: [0; 7],
    get_decoder_information_enumerator: 0,
    create_async: decoder_create,
    create_with_id_async: 0,
};

unsafe extern "system" fn decoder_create(this: RawPtr, stream: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, _| {
        let stream = argument(stream, &RandomAccessStream::IID)?;
        let bytes = match stream.kind.borrow().as_ref() {
            Some(Kind::Stream(stream)) => stream.remaining(),
            _ => return Err(hresult::E_INVALIDARG),
        };
        let decoder = parse_image(&bytes)
            .map(|(width, height)| Value::Object(new_handle(&object.shared, Kind::Decoder { width, height })));
        unsafe { *out = new_operation(&object.shared, OpKind::Decode, decoder) };
        Ok(())
    })
}

static FRAME_VTBL: IBitmapFrameWithSoftwareBitmapVtbl = IBitmapFrameWithSoftwareBitmapVtbl {
    base: INSPECTABLE,
    get_software_bitmap_async: frame_software_bitmap,
    get_software_bitmap_converted_async: 0,
    get_software_bitmap_transformed_async: 0,
};

unsafe extern "system" fn frame_software_bitmap(this: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, kind| match *kind {
        Kind::Decoder { width, height } => {
            let bitmap = new_handle(&object.shared, Kind::Bitmap { width, height });
            unsafe { *out = new_operation(&object.shared, OpKind::Bitmap, Some(Value::Object(bitmap))) };
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

static BITMAP_VTBL: ISoftwareBitmapVtbl = ISoftwareBitmapVtbl {
    base: INSPECTABLE,
    bitmap_pixel_format: 0,
    bitmap_alpha_mode: 0,
    pixel_width: bitmap_width,
    pixel_height: bitmap_height,
    other: [0; 10],
};

unsafe extern "system" fn bitmap_width(this: RawPtr, out: *mut i32) -> HRESULT {
    call(this, |_, kind| match *kind {
        Kind::Bitmap { width, .. } => {
            unsafe { *out = width };
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

unsafe extern "system" fn bitmap_height(this: RawPtr, out: *mut i32) -> HRESULT {
    call(this, |_, kind| match *kind {
        Kind::Bitmap { height, .. } => {
            unsafe { *out = height };
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

static LANGUAGE_FACTORY_VTBL: ILanguageFactoryVtbl = ILanguageFactoryVtbl {
    base: INSPECTABLE,
    create_language: language_factory_create,
};

unsafe extern "system" fn language_factory_create(this: RawPtr, tag: RawHString, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, _| {
        let tag = object.shared.read_string(tag);
        object.ledger().languages_tried.borrow_mut().push(tag.clone());
        let well_formed = !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !well_formed {
            return Err(hresult::E_INVALIDARG);
        }
        unsafe { *out = new_object(&object.shared, Kind::Language { tag }) };
        Ok(())
    })
}

static LANGUAGE_VTBL: ILanguageVtbl = ILanguageVtbl {
    base: INSPECTABLE,
    language_tag,
    display_name: 0,
    native_name: 0,
    script: 0,
};

unsafe extern "system" fn language_tag(this: RawPtr, out: *mut RawHString) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, kind| match kind {
        Kind::Language { tag } => {
            unsafe { *out = object.shared.create_string(tag) };
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

static ENGINE_STATICS_VTBL: IOcrEngineStaticsVtbl = IOcrEngineStaticsVtbl {
    base: INSPECTABLE,
    max_image_dimension: 0,
    available_recognizer_languages: 0,
    is_language_supported: 0,
    try_create_from_language: engine_from_language,
    try_create_from_user_profile_languages: engine_from_profile,
};

fn new_engine(shared: &Rc<Shared>, language: &str) -> RawPtr {
    shared.ledger.engines.borrow_mut().push(language.to_string());
    new_object(
        shared,
        Kind::Engine {
            language: language.to_string(),
        },
    )
}

unsafe extern "system" fn engine_from_language(this: RawPtr, language: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, _| {
        let language = argument(language, &Language::IID)?;
        let tag = match language.kind.borrow().as_ref() {
            Some(Kind::Language { tag }) => tag.clone(),
            _ => return Err(hresult::E_INVALIDARG),
        };
        if object.shared.scenario.installed.contains(&tag) {
            unsafe { *out = new_engine(&object.shared, &tag) };
        }
        Ok(())
    })
}

unsafe extern "system" fn engine_from_profile(this: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, _| {
        if let Some(tag) = &object.shared.scenario.profile_language {
            unsafe { *out = new_engine(&object.shared, tag) };
        }
        Ok(())
    })
}

static ENGINE_VTBL: IOcrEngineVtbl = IOcrEngineVtbl {
    base: INSPECTABLE,
    recognize_async: engine_recognize,
    recognizer_language: engine_language,
};

unsafe extern "system" fn engine_recognize(this: RawPtr, bitmap: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, _| {
        argument(bitmap, &SoftwareBitmap::IID)?;
        let lines = object.shared.scenario.lines.clone();
        let result = new_handle(&object.shared, Kind::Result { lines });
        unsafe { *out = new_operation(&object.shared, OpKind::Recognize, Some(Value::Object(result))) };
        Ok(())
    })
}

unsafe extern "system" fn engine_language(this: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, kind| match kind {
        Kind::Engine { language } => {
            let tag = language.clone();
            unsafe { *out = new_object(&object.shared, Kind::Language { tag }) };
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

static RESULT_VTBL: IOcrResultVtbl = IOcrResultVtbl {
    base: INSPECTABLE,
    lines: result_lines,
    text_angle: 0,
    text: 0,
};

unsafe extern "system" fn result_lines(this: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, kind| match kind {
        Kind::Result { lines } => {
            let items = lines.iter().cloned().map(Item::Line).collect();
            unsafe { *out = new_object(&object.shared, Kind::Vector(items)) };
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

static VECTOR_VTBL: IVectorViewVtbl = IVectorViewVtbl {
    base: INSPECTABLE,
    get_at: vector_get_at,
    size: vector_size,
    index_of: 0,
    get_many: 0,
};

unsafe extern "system" fn vector_get_at(this: RawPtr, index: u32, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, kind| match kind {
        Kind::Vector(items) => {
            let kind = match items.get(index as usize).ok_or(hresult::E_BOUNDS)? {
                Item::Line(line) => Kind::Line(line.clone()),
                Item::Word(rect) => Kind::Word(*rect),
            };
            unsafe { *out = new_object(&object.shared, kind) };
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

unsafe extern "system" fn vector_size(this: RawPtr, out: *mut u32) -> HRESULT {
    call(this, |_, kind| match kind {
        Kind::Vector(items) => {
            unsafe { *out = items.len() as u32 };
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

static LINE_VTBL: IOcrLineVtbl = IOcrLineVtbl {
    base: INSPECTABLE,
    words: line_words,
    text: line_text,
};

unsafe extern "system" fn line_words(this: RawPtr, out: *mut RawPtr) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, kind| match kind {
        Kind::Line(line) => {
            let items = line.words.iter().copied().map(Item::Word).collect();
            unsafe { *out = new_object(&object.shared, Kind::Vector(items)) };
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

unsafe extern "system" fn line_text(this: RawPtr, out: *mut RawHString) -> HRESULT {
    unsafe { *out = ptr::null_mut() };
    call(this, |object, kind| match kind {
        Kind::Line(line) => {
            unsafe { *out = object.shared.create_string(&line.text) };
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

static WORD_VTBL: IOcrWordVtbl = IOcrWordVtbl {
    base: INSPECTABLE,
    bounding_rect: word_rect,
    text: 0,
};

unsafe extern "system" fn word_rect(this: RawPtr, out: *mut Rect) -> HRESULT {
    call(this, |_, kind| match kind {
        Kind::Word(rect) => {
            unsafe { *out = *rect };
            Ok(())
        }
        _ => Err(hresult::E_UNEXPECTED),
    })
}

