//! Embedded WGSL for the lit, textured sphere.
//!
//! Both stages declare the same `FrameUniforms` block at group 0 binding 0;
//! the fragment stage additionally samples the surface texture.

/// Vertex stage: transforms to clip space and hands eye-space normal and
/// position to the fragment stage.
pub const SPHERE_VERTEX_SHADER: &str = r#"
struct FrameUniforms {
    mvp_matrix: mat4x4<f32>,
    model_view_matrix: mat4x4<f32>,
    light_direction: vec3<f32>,
    viewer_position: vec3<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) texcoord: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) texcoord: vec2<f32>,
    @location(2) eye_position: vec3<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let model_view = frame.model_view_matrix;
    let normal_matrix = mat3x3<f32>(model_view[0].xyz, model_view[1].xyz, model_view[2].xyz);

    var out: VertexOutput;
    out.clip_position = frame.mvp_matrix * vec4<f32>(in.position, 1.0);
    out.normal = normalize(normal_matrix * in.normal);
    out.texcoord = in.texcoord;
    out.eye_position = (model_view * vec4<f32>(in.position, 1.0)).xyz;
    return out;
}
"#;

/// Fragment stage: day/night terminator shading over the sampled texel.
pub const SPHERE_FRAGMENT_SHADER: &str = r#"
struct FrameUniforms {
    mvp_matrix: mat4x4<f32>,
    model_view_matrix: mat4x4<f32>,
    light_direction: vec3<f32>,
    viewer_position: vec3<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

@group(0) @binding(1)
var surface_texture: texture_2d<f32>;
@group(0) @binding(2)
var surface_sampler: sampler;

struct FragmentInput {
    @location(0) normal: vec3<f32>,
    @location(1) texcoord: vec2<f32>,
    @location(2) eye_position: vec3<f32>,
};

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let normal = normalize(in.normal);
    let view_dir = normalize(frame.viewer_position - in.eye_position);
    let light_dir = normalize(frame.light_direction);

    let d = dot(normal, light_dir);
    let daylight = smoothstep(-1.0, 1.0, d);

    let ambient = 0.2 * mix(0.7, 1.0, daylight);
    let diffuse = pow(max(d, 0.0), 2.0);
    let reflect_dir = reflect(-light_dir, normal);
    let specular = 0.1 * pow(max(dot(view_dir, reflect_dir), 0.0), 32.0) * daylight;

    let texel = textureSample(surface_texture, surface_sampler, in.texcoord);
    return vec4<f32>((ambient + diffuse + specular) * texel.rgb, texel.a);
}
"#;

/// Uniform names bound every frame.
pub mod names {
    pub const MVP_MATRIX: &str = "mvp_matrix";
    pub const MODEL_VIEW_MATRIX: &str = "model_view_matrix";
    pub const LIGHT_DIRECTION: &str = "light_direction";
    pub const VIEWER_POSITION: &str = "viewer_position";
    pub const SURFACE_TEXTURE: &str = "surface_texture";
    pub const SURFACE_SAMPLER: &str = "surface_sampler";

    pub const POSITION: &str = "position";
    pub const NORMAL: &str = "normal";
    pub const TEXCOORD: &str = "texcoord";
}
