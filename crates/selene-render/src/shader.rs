//! Shader compilation, program linking and location lookup.
//!
//! Each stage is parsed and validated on the CPU with `naga` before any GPU
//! object exists, so a bad shader is reported with the compiler's own
//! diagnostics instead of a device validation panic. Linking then checks that
//! the two stages agree on their interface, and reflects the names the frame
//! renderer binds values to.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use naga::{Binding, Module, TypeInner};
use thiserror::Error;

/// Errors raised while building a [`ShaderProgram`].
#[derive(Debug, Error)]
pub enum ShaderError {
    /// A single stage failed to parse or validate.
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    /// Both stages compiled but do not form a usable program.
    #[error("shader program failed to link: {log}")]
    Link { log: String },
}

/// Programmable pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn matches(self, stage: naga::ShaderStage) -> bool {
        matches!(
            (self, stage),
            (Self::Vertex, naga::ShaderStage::Vertex) | (Self::Fragment, naga::ShaderStage::Fragment)
        )
    }

    fn visibility(self) -> wgpu::ShaderStages {
        match self {
            Self::Vertex => wgpu::ShaderStages::VERTEX,
            Self::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Identity of one successfully linked program.
///
/// Every link produces a fresh id, so locations resolved against an earlier
/// program never match a later one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u64);

impl ProgramId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Where a uniform value lives inside a linked program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformLocation {
    /// A value stored in a uniform buffer at `offset`, spanning at most `size` bytes.
    Block {
        program: ProgramId,
        group: u32,
        binding: u32,
        offset: u32,
        size: u32,
    },
    /// An opaque resource slot such as a texture or sampler.
    Resource {
        program: ProgramId,
        group: u32,
        binding: u32,
    },
    /// The name is not used by the program. Writes through it are ignored.
    Invalid,
}

impl UniformLocation {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }

    pub fn program(&self) -> Option<ProgramId> {
        match *self {
            Self::Block { program, .. } | Self::Resource { program, .. } => Some(program),
            Self::Invalid => None,
        }
    }
}

/// Vertex input slot of a linked program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeLocation {
    Slot { program: ProgramId, location: u32 },
    Invalid,
}

impl AttributeLocation {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Shader location, if the attribute exists in `program`.
    pub fn slot_for(&self, program: ProgramId) -> Option<u32> {
        match *self {
            Self::Slot {
                program: owner,
                location,
            } if owner == program => Some(location),
            _ => None,
        }
    }
}

/// A vertex shader input discovered by reflection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: String,
    pub location: u32,
    pub format: wgpu::VertexFormat,
}

/// Kind of resource bound at a group/binding slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    UniformBuffer { size: u32 },
    Texture2d,
    Sampler,
}

/// A bind-group slot used by either stage of the program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceSlot {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub kind: ResourceKind,
    pub visibility: wgpu::ShaderStages,
}

/// One stage that parsed and validated.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    stage: ShaderStage,
    source: String,
    module: Module,
}

impl CompiledStage {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Parse and validate one stage of WGSL source.
pub fn compile_stage(stage: ShaderStage, source: &str) -> Result<CompiledStage, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        stage,
        log: e.emit_to_string(source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|e| ShaderError::Compile {
        stage,
        log: e.emit_to_string(source),
    })?;

    debug!("Compiled {stage} shader ({} bytes of source)", source.len());

    Ok(CompiledStage {
        stage,
        source: source.to_owned(),
        module,
    })
}

/// A linked vertex + fragment program with its reflected interface.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    id: ProgramId,
    vertex: CompiledStage,
    fragment: CompiledStage,
    vertex_entry: String,
    fragment_entry: String,
    attributes: Vec<VertexAttribute>,
    uniforms: HashMap<String, UniformLocation>,
    resources: Vec<ResourceSlot>,
}

impl ShaderProgram {
    /// Compile both stages and link them.
    pub fn compile_and_link(
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = compile_stage(ShaderStage::Vertex, vertex_source)?;
        let fragment = compile_stage(ShaderStage::Fragment, fragment_source)?;
        Self::link(vertex, fragment)
    }

    /// Link two compiled stages.
    pub fn link(vertex: CompiledStage, fragment: CompiledStage) -> Result<Self, ShaderError> {
        if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
            return link_error(format!(
                "expected vertex and fragment stages, got {} and {}",
                vertex.stage, fragment.stage
            ));
        }

        let vs = entry_point(&vertex)?;
        let fs = entry_point(&fragment)?;

        let outputs = vertex_outputs(&vertex.module, vs);
        for (location, (name, inner)) in fragment_inputs(&fragment.module, fs) {
            match outputs.get(&location) {
                None => {
                    return link_error(format!(
                        "fragment input '{name}' at location {location} is not written by the vertex stage"
                    ));
                }
                Some(produced) if *produced != inner => {
                    return link_error(format!(
                        "fragment input '{name}' at location {location} is {inner:?}, vertex stage writes {produced:?}"
                    ));
                }
                Some(_) => {}
            }
        }

        let id = ProgramId::next();
        let attributes = vertex_attributes(&vertex.module, vs)?;
        let (resources, uniforms) = reflect_resources(id, &vertex, &fragment)?;

        debug!(
            "Linked shader program {} ({} attributes, {} uniforms, {} resource slots)",
            id.get(),
            attributes.len(),
            uniforms.len(),
            resources.len()
        );

        Ok(Self {
            id,
            vertex_entry: vs.name.clone(),
            fragment_entry: fs.name.clone(),
            vertex,
            fragment,
            attributes,
            uniforms,
            resources,
        })
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Location of a uniform by name, or [`UniformLocation::Invalid`].
    ///
    /// Names are uniform struct members, whole uniform variables, or
    /// texture/sampler variables.
    pub fn uniform_location(&self, name: &str) -> UniformLocation {
        self.uniforms
            .get(name)
            .copied()
            .unwrap_or(UniformLocation::Invalid)
    }

    /// Location of a vertex attribute by name, or [`AttributeLocation::Invalid`].
    pub fn attribute_location(&self, name: &str) -> AttributeLocation {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map_or(AttributeLocation::Invalid, |a| AttributeLocation::Slot {
                program: self.id,
                location: a.location,
            })
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Bind-group slots ordered by `(group, binding)`.
    pub fn resources(&self) -> &[ResourceSlot] {
        &self.resources
    }

    pub fn vertex_source(&self) -> &str {
        self.vertex.source()
    }

    pub fn fragment_source(&self) -> &str {
        self.fragment.source()
    }

    pub fn vertex_entry_point(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry_point(&self) -> &str {
        &self.fragment_entry
    }
}

fn link_error<T>(log: String) -> Result<T, ShaderError> {
    Err(ShaderError::Link { log })
}

fn entry_point(stage: &CompiledStage) -> Result<&naga::EntryPoint, ShaderError> {
    stage
        .module
        .entry_points
        .iter()
        .find(|ep| stage.stage.matches(ep.stage))
        .ok_or_else(|| ShaderError::Link {
            log: format!("{} source has no @{} entry point", stage.stage, stage.stage),
        })
}

/// Flatten an entry point argument or result into its `@location` members.
fn collect_locations(
    module: &Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<(u32, String, naga::Handle<naga::Type>)>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.push((*location, name.unwrap_or_default().to_owned(), ty));
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(
                        module,
                        member.name.as_deref(),
                        member.ty,
                        member.binding.as_ref(),
                        out,
                    );
                }
            }
        }
    }
}

fn vertex_outputs(module: &Module, ep: &naga::EntryPoint) -> HashMap<u32, TypeInner> {
    let mut found = Vec::new();
    if let Some(result) = &ep.function.result {
        collect_locations(module, None, result.ty, result.binding.as_ref(), &mut found);
    }
    found
        .into_iter()
        .map(|(location, _, ty)| (location, module.types[ty].inner.clone()))
        .collect()
}

fn fragment_inputs(module: &Module, ep: &naga::EntryPoint) -> BTreeMap<u32, (String, TypeInner)> {
    let mut found = Vec::new();
    for arg in &ep.function.arguments {
        collect_locations(module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut found);
    }
    found
        .into_iter()
        .map(|(location, name, ty)| (location, (name, module.types[ty].inner.clone())))
        .collect()
}

fn vertex_attributes(
    module: &Module,
    ep: &naga::EntryPoint,
) -> Result<Vec<VertexAttribute>, ShaderError> {
    let mut found = Vec::new();
    for arg in &ep.function.arguments {
        collect_locations(module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut found);
    }

    let mut attributes = found
        .into_iter()
        .map(|(location, name, ty)| {
            let format = vertex_format(&module.types[ty].inner).ok_or_else(|| ShaderError::Link {
                log: format!("vertex attribute '{name}' has an unsupported type"),
            })?;
            Ok(VertexAttribute {
                name,
                location,
                format,
            })
        })
        .collect::<Result<Vec<_>, ShaderError>>()?;
    attributes.sort_by_key(|a| a.location);
    Ok(attributes)
}

fn vertex_format(inner: &TypeInner) -> Option<wgpu::VertexFormat> {
    use naga::{Scalar, VectorSize};
    use wgpu::VertexFormat as F;

    match *inner {
        TypeInner::Scalar(Scalar::F32) => Some(F::Float32),
        TypeInner::Scalar(Scalar::U32) => Some(F::Uint32),
        TypeInner::Scalar(Scalar::I32) => Some(F::Sint32),
        TypeInner::Vector { size, scalar } if scalar == Scalar::F32 => Some(match size {
            VectorSize::Bi => F::Float32x2,
            VectorSize::Tri => F::Float32x3,
            VectorSize::Quad => F::Float32x4,
        }),
        TypeInner::Vector { size, scalar } if scalar == Scalar::U32 => Some(match size {
            VectorSize::Bi => F::Uint32x2,
            VectorSize::Tri => F::Uint32x3,
            VectorSize::Quad => F::Uint32x4,
        }),
        _ => None,
    }
}

/// Byte size of a host-shareable type, following WGSL layout rules.
fn type_size(module: &Module, ty: naga::Handle<naga::Type>) -> Option<u32> {
    match module.types[ty].inner {
        TypeInner::Scalar(scalar) => Some(u32::from(scalar.width)),
        TypeInner::Vector { size, scalar } => Some(size as u32 * u32::from(scalar.width)),
        TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } => {
            // Columns are padded to vec4 when they hold three rows.
            let row_span = if rows as u32 == 3 { 4 } else { rows as u32 };
            Some(columns as u32 * row_span * u32::from(scalar.width))
        }
        TypeInner::Struct { span, .. } => Some(span),
        TypeInner::Array {
            size: naga::ArraySize::Constant(count),
            stride,
            ..
        } => Some(count.get() * stride),
        _ => None,
    }
}

/// Handle-free description of a type's memory layout, comparable across modules.
fn layout_signature(module: &Module, ty: naga::Handle<naga::Type>) -> String {
    match &module.types[ty].inner {
        TypeInner::Struct { members, span } => {
            let fields: Vec<String> = members
                .iter()
                .map(|m| {
                    format!(
                        "{}@{}:{}",
                        m.name.as_deref().unwrap_or("_"),
                        m.offset,
                        layout_signature(module, m.ty)
                    )
                })
                .collect();
            format!("struct[{span}]{{{}}}", fields.join(","))
        }
        TypeInner::Array { base, size, stride } => {
            format!("array<{},{size:?},{stride}>", layout_signature(module, *base))
        }
        other => format!("{other:?}"),
    }
}

struct SlotEntry {
    slot: ResourceSlot,
    signature: String,
}

fn reflect_resources(
    program: ProgramId,
    vertex: &CompiledStage,
    fragment: &CompiledStage,
) -> Result<(Vec<ResourceSlot>, HashMap<String, UniformLocation>), ShaderError> {
    let mut slots: BTreeMap<(u32, u32), SlotEntry> = BTreeMap::new();
    let mut uniforms: HashMap<String, UniformLocation> = HashMap::new();

    for stage in [vertex, fragment] {
        let module = &stage.module;
        for (_, var) in module.global_variables.iter() {
            let Some(rb) = &var.binding else { continue };
            let name = var.name.clone().unwrap_or_default();

            let kind = match (&var.space, &module.types[var.ty].inner) {
                (naga::AddressSpace::Uniform, _) => ResourceKind::UniformBuffer {
                    size: type_size(module, var.ty).ok_or_else(|| ShaderError::Link {
                        log: format!("uniform '{name}' has no fixed size"),
                    })?,
                },
                (naga::AddressSpace::Handle, TypeInner::Image { dim, arrayed, class }) => {
                    let sampled_float = matches!(
                        class,
                        naga::ImageClass::Sampled {
                            kind: naga::ScalarKind::Float,
                            multi: false
                        }
                    );
                    if *dim != naga::ImageDimension::D2 || *arrayed || !sampled_float {
                        return link_error(format!(
                            "texture '{name}' must be a non-arrayed texture_2d<f32>"
                        ));
                    }
                    ResourceKind::Texture2d
                }
                (naga::AddressSpace::Handle, TypeInner::Sampler { comparison: false }) => {
                    ResourceKind::Sampler
                }
                _ => {
                    return link_error(format!(
                        "resource '{name}' at group {} binding {} has an unsupported type",
                        rb.group, rb.binding
                    ));
                }
            };

            let signature = layout_signature(module, var.ty);
            let key = (rb.group, rb.binding);
            match slots.get_mut(&key) {
                Some(existing) => {
                    if existing.slot.kind != kind || existing.signature != signature {
                        return link_error(format!(
                            "group {} binding {} is declared differently by the two stages ('{}' vs '{name}')",
                            rb.group, rb.binding, existing.slot.name
                        ));
                    }
                    existing.slot.visibility |= stage.stage.visibility();
                }
                None => {
                    slots.insert(
                        key,
                        SlotEntry {
                            slot: ResourceSlot {
                                name: name.clone(),
                                group: rb.group,
                                binding: rb.binding,
                                kind,
                                visibility: stage.stage.visibility(),
                            },
                            signature,
                        },
                    );
                }
            }

            let mut named = Vec::new();
            match kind {
                ResourceKind::UniformBuffer { size } => {
                    named.push((
                        name.clone(),
                        UniformLocation::Block {
                            program,
                            group: rb.group,
                            binding: rb.binding,
                            offset: 0,
                            size,
                        },
                    ));
                    if let TypeInner::Struct { members, span } = &module.types[var.ty].inner {
                        for (i, member) in members.iter().enumerate() {
                            let Some(member_name) = &member.name else { continue };
                            let end = members.get(i + 1).map_or(*span, |next| next.offset);
                            named.push((
                                member_name.clone(),
                                UniformLocation::Block {
                                    program,
                                    group: rb.group,
                                    binding: rb.binding,
                                    offset: member.offset,
                                    size: end - member.offset,
                                },
                            ));
                        }
                    }
                }
                ResourceKind::Texture2d | ResourceKind::Sampler => {
                    named.push((
                        name.clone(),
                        UniformLocation::Resource {
                            program,
                            group: rb.group,
                            binding: rb.binding,
                        },
                    ));
                }
            }

            for (uniform_name, location) in named {
                if uniform_name.is_empty() {
                    continue;
                }
                if let Some(previous) = uniforms.get(&uniform_name) {
                    if *previous != location {
                        return link_error(format!(
                            "uniform '{uniform_name}' resolves to different locations in the two stages"
                        ));
                    }
                    continue;
                }
                uniforms.insert(uniform_name, location);
            }
        }
    }

    Ok((slots.into_values().map(|e| e.slot).collect(), uniforms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{SPHERE_FRAGMENT_SHADER, SPHERE_VERTEX_SHADER};

    fn sphere_program() -> ShaderProgram {
        ShaderProgram::compile_and_link(SPHERE_VERTEX_SHADER, SPHERE_FRAGMENT_SHADER)
            .expect("sphere shaders must link")
    }

    const MINIMAL_VERTEX: &str = r#"
struct Out {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> Out {
    var out: Out;
    out.clip = vec4<f32>(position, 1.0);
    out.uv = position.xy;
    return out;
}
"#;

    #[test]
    fn test_sphere_shaders_link() {
        let program = sphere_program();
        assert_eq!(program.vertex_entry_point(), "vs_main");
        assert_eq!(program.fragment_entry_point(), "fs_main");
    }

    #[test]
    fn test_attribute_locations_resolve() {
        let program = sphere_program();
        let id = program.id();
        assert_eq!(program.attribute_location("position").slot_for(id), Some(0));
        assert_eq!(program.attribute_location("normal").slot_for(id), Some(1));
        assert_eq!(program.attribute_location("texcoord").slot_for(id), Some(2));
        assert_eq!(program.attribute_location("tangent"), AttributeLocation::Invalid);

        let formats: Vec<_> = program.attributes().iter().map(|a| a.format).collect();
        assert_eq!(
            formats,
            [
                wgpu::VertexFormat::Float32x3,
                wgpu::VertexFormat::Float32x3,
                wgpu::VertexFormat::Float32x2
            ]
        );
    }

    #[test]
    fn test_uniform_offsets_follow_wgsl_layout() {
        let program = sphere_program();
        let offset = |name: &str| match program.uniform_location(name) {
            UniformLocation::Block { offset, .. } => offset,
            other => panic!("{name} resolved to {other:?}"),
        };
        assert_eq!(offset("mvp_matrix"), 0);
        assert_eq!(offset("model_view_matrix"), 64);
        assert_eq!(offset("light_direction"), 128);
        assert_eq!(offset("viewer_position"), 144);
    }

    #[test]
    fn test_texture_and_sampler_are_resources() {
        let program = sphere_program();
        assert!(matches!(
            program.uniform_location("surface_texture"),
            UniformLocation::Resource { group: 0, binding: 1, .. }
        ));
        assert!(matches!(
            program.uniform_location("surface_sampler"),
            UniformLocation::Resource { group: 0, binding: 2, .. }
        ));
        assert_eq!(program.uniform_location("no_such_uniform"), UniformLocation::Invalid);
    }

    #[test]
    fn test_shared_uniform_block_is_visible_to_both_stages() {
        let program = sphere_program();
        let block = &program.resources()[0];
        assert_eq!((block.group, block.binding), (0, 0));
        assert_eq!(block.kind, ResourceKind::UniformBuffer { size: 160 });
        assert_eq!(
            block.visibility,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT
        );
        assert_eq!(program.resources()[1].visibility, wgpu::ShaderStages::FRAGMENT);
    }

    #[test]
    fn test_each_link_gets_a_new_program_id() {
        let a = sphere_program();
        let b = sphere_program();
        assert_ne!(a.id(), b.id());
        let stale = a.attribute_location("position");
        assert_eq!(stale.slot_for(b.id()), None);
    }

    #[test]
    fn test_syntax_error_is_compile_error() {
        let broken = SPHERE_VERTEX_SHADER.replace("fn vs_main", "fn vs_main(");
        let err = ShaderProgram::compile_and_link(&broken, SPHERE_FRAGMENT_SHADER).unwrap_err();
        match err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn test_type_error_is_compile_error() {
        let broken = SPHERE_FRAGMENT_SHADER.replace("let d = dot(normal, light_dir);", "let d = dot(normal, in.texcoord);");
        assert!(matches!(
            ShaderProgram::compile_and_link(SPHERE_VERTEX_SHADER, &broken),
            Err(ShaderError::Compile { stage: ShaderStage::Fragment, .. })
        ));
    }

    #[test]
    fn test_missing_fragment_entry_point_fails_link() {
        let err = ShaderProgram::compile_and_link(MINIMAL_VERTEX, MINIMAL_VERTEX).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }), "{err}");
    }

    #[test]
    fn test_unwritten_fragment_input_fails_link() {
        let fragment = r#"
@fragment
fn fs_main(@location(3) shade: f32) -> @location(0) vec4<f32> {
    return vec4<f32>(shade);
}
"#;
        let err = ShaderProgram::compile_and_link(MINIMAL_VERTEX, fragment).unwrap_err();
        let ShaderError::Link { log } = err else {
            panic!("expected link error");
        };
        assert!(log.contains("location 3"), "{log}");
    }

    #[test]
    fn test_mismatched_varying_type_fails_link() {
        let fragment = r#"
@fragment
fn fs_main(@location(0) uv: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, 1.0);
}
"#;
        assert!(matches!(
            ShaderProgram::compile_and_link(MINIMAL_VERTEX, fragment),
            Err(ShaderError::Link { .. })
        ));
    }

    #[test]
    fn test_conflicting_uniform_layouts_fail_link() {
        let fragment = r#"
struct Other {
    tint: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Other;

@fragment
fn fs_main(@location(0) normal: vec3<f32>) -> @location(0) vec4<f32> {
    return frame.tint * vec4<f32>(normal, 1.0);
}
"#;
        let err = ShaderProgram::compile_and_link(SPHERE_VERTEX_SHADER, fragment).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }), "{err}");
    }
}
