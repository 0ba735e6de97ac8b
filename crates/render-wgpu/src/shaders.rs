//! WGSL sources. Every pipeline is built from [`COMMON`] followed by its own
//! pass source, so the frame uniforms, the sky model, environment lookups and
//! tone mapping are shared.
//!
//! `sky_radiance` mirrors `SkyScattering::radiance` and `aces_filmic` mirrors
//! `seascape_render::tonemap::aces_filmic`.

/// Frame uniforms, environment bindings, sky model and tone mapping.
pub const COMMON: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    // xyz eye, w exposure
    eye_exposure: vec4<f32>,
    // xyz normalized sky sun, w sun intensity
    sun_dir_e: vec4<f32>,
    // xyz up, w sun fade
    up_fade: vec4<f32>,
    // xyz rayleigh beta, w mie directional g
    beta_r_g: vec4<f32>,
    beta_m: vec4<f32>,
    // xyz water sun direction, w time
    water_sun_time: vec4<f32>,
    // rgb sun colour, w normal map size
    sun_color_size: vec4<f32>,
    // rgb water colour, w alpha
    water_color_alpha: vec4<f32>,
    // distortion scale, plane extent, fog flag, env max mip
    water_misc: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

struct Sh {
    c: array<vec4<f32>, 9>,
};

@group(1) @binding(0)
var env_cube: texture_cube<f32>;
@group(1) @binding(1)
var env_sampler: sampler;
@group(1) @binding(2)
var<uniform> sh: Sh;

const PI: f32 = 3.141592653589793;
const RAYLEIGH_ZENITH_LENGTH: f32 = 8400.0;
const MIE_ZENITH_LENGTH: f32 = 1250.0;
const SUN_ANGULAR_DIAMETER_COS: f32 = 0.9999567;
const THREE_OVER_SIXTEEN_PI: f32 = 0.05968310365946075;
const ONE_OVER_FOUR_PI: f32 = 0.07957747154594767;

fn sky_radiance(dir_in: vec3<f32>) -> vec3<f32> {
    let direction = normalize(dir_in);
    let up = frame.up_fade.xyz;
    let sun = frame.sun_dir_e.xyz;
    let sun_e = frame.sun_dir_e.w;
    let beta_r = frame.beta_r_g.xyz;
    let beta_m = frame.beta_m.xyz;
    let g = frame.beta_r_g.w;

    let zenith_angle = acos(max(dot(up, direction), 0.0));
    let inv = 1.0 / (cos(zenith_angle) + 0.15 * pow(93.885 - degrees(zenith_angle), -1.253));
    let s_r = RAYLEIGH_ZENITH_LENGTH * inv;
    let s_m = MIE_ZENITH_LENGTH * inv;
    let fex = exp(-(beta_r * s_r + beta_m * s_m));

    let cos_theta = dot(direction, sun);
    let rc = cos_theta * 0.5 + 0.5;
    let r_phase = THREE_OVER_SIXTEEN_PI * (1.0 + rc * rc);
    let g2 = g * g;
    let m_phase = ONE_OVER_FOUR_PI * ((1.0 - g2) / pow(1.0 - 2.0 * g * cos_theta + g2, 1.5));
    let ratio = (beta_r * r_phase + beta_m * m_phase) / (beta_r + beta_m);

    var lin = pow(max(sun_e * ratio * (1.0 - fex), vec3<f32>(0.0)), vec3<f32>(1.5));
    let horizon_blend = clamp(pow(1.0 - dot(up, sun), 5.0), 0.0, 1.0);
    let low_sun = pow(max(sun_e * ratio * fex, vec3<f32>(0.0)), vec3<f32>(0.5));
    lin *= mix(vec3<f32>(1.0), low_sun, horizon_blend);

    var l0 = 0.1 * fex;
    let sundisk = smoothstep(SUN_ANGULAR_DIAMETER_COS, SUN_ANGULAR_DIAMETER_COS + 0.00002, cos_theta);
    l0 += sun_e * 19000.0 * fex * sundisk;

    let color = (lin + l0) * 0.04 + vec3<f32>(0.0, 0.0003, 0.00075);
    return pow(color, vec3<f32>(1.0 / (1.2 + 1.2 * frame.up_fade.w)));
}

fn sh_irradiance(n: vec3<f32>) -> vec3<f32> {
    let e = sh.c[0].rgb * 0.282095
        + sh.c[1].rgb * (0.488603 * n.y)
        + sh.c[2].rgb * (0.488603 * n.z)
        + sh.c[3].rgb * (0.488603 * n.x)
        + sh.c[4].rgb * (1.092548 * n.x * n.y)
        + sh.c[5].rgb * (1.092548 * n.y * n.z)
        + sh.c[6].rgb * (0.315392 * (3.0 * n.z * n.z - 1.0))
        + sh.c[7].rgb * (1.092548 * n.x * n.z)
        + sh.c[8].rgb * (0.546274 * (n.x * n.x - n.y * n.y));
    return max(e, vec3<f32>(0.0));
}

fn env_radiance(dir: vec3<f32>, roughness: f32) -> vec3<f32> {
    let level = round(clamp(roughness, 0.0, 1.0) * frame.water_misc.w);
    return textureSampleLevel(env_cube, env_sampler, dir, level).rgb;
}

fn rrt_and_odt_fit(v: vec3<f32>) -> vec3<f32> {
    let a = v * (v + 0.0245786) - 0.000090537;
    let b = v * (0.983729 * v + 0.4329510) + 0.238081;
    return a / b;
}

fn aces_filmic(color: vec3<f32>, exposure: f32) -> vec3<f32> {
    let aces_input = mat3x3<f32>(
        vec3<f32>(0.59719, 0.07600, 0.02840),
        vec3<f32>(0.35458, 0.90834, 0.13383),
        vec3<f32>(0.04823, 0.01566, 0.83777),
    );
    let aces_output = mat3x3<f32>(
        vec3<f32>(1.60475, -0.10208, -0.00327),
        vec3<f32>(-0.53108, 1.10813, -0.07276),
        vec3<f32>(-0.07367, -0.00605, 1.07602),
    );
    var c = color * (exposure / 0.6);
    c = aces_input * c;
    c = rrt_and_odt_fit(c);
    c = aces_output * c;
    return clamp(c, vec3<f32>(0.0), vec3<f32>(1.0));
}
"#;

/// Fullscreen sky dome: one oversized triangle, view rays reconstructed from
/// the inverse view-projection.
pub const SKY: &str = r#"
struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

@vertex
fn vs_sky(@builtin(vertex_index) index: u32) -> SkyOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    let ndc = uv * 2.0 - 1.0;
    var out: SkyOutput;
    out.clip_position = vec4<f32>(ndc, 1.0, 1.0);
    out.ndc = ndc;
    return out;
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    let far = frame.inv_view_proj * vec4<f32>(in.ndc, 1.0, 1.0);
    let near = frame.inv_view_proj * vec4<f32>(in.ndc, 0.0, 1.0);
    let dir = normalize(far.xyz / far.w - near.xyz / near.w);
    return vec4<f32>(aces_filmic(sky_radiance(dir), frame.eye_exposure.w), 1.0);
}
"#;

/// Animated water plane lit by the sun and the environment cube.
pub const WATER: &str = r#"
@group(2) @binding(0)
var normal_tex: texture_2d<f32>;
@group(2) @binding(1)
var normal_sampler: sampler;

struct WaterOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
};

// Unit quad in xz, scaled to the plane extent.
@vertex
fn vs_water(@location(0) position: vec3<f32>) -> WaterOutput {
    let world = vec3<f32>(position.x * frame.water_misc.y, 0.0, position.z * frame.water_misc.y);
    var out: WaterOutput;
    out.clip_position = frame.view_proj * vec4<f32>(world, 1.0);
    out.world_pos = world;
    return out;
}

fn get_noise(uv: vec2<f32>) -> vec4<f32> {
    let time = frame.water_sun_time.w;
    let uv0 = uv / 103.0 + vec2<f32>(time / 17.0, time / 29.0);
    let uv1 = uv / 107.0 - vec2<f32>(time / -19.0, time / 31.0);
    let uv2 = uv / vec2<f32>(8907.0, 9803.0) + vec2<f32>(time / 101.0, time / 97.0);
    let uv3 = uv / vec2<f32>(1091.0, 1027.0) - vec2<f32>(time / 109.0, time / -113.0);
    let noise = textureSample(normal_tex, normal_sampler, uv0)
        + textureSample(normal_tex, normal_sampler, uv1)
        + textureSample(normal_tex, normal_sampler, uv2)
        + textureSample(normal_tex, normal_sampler, uv3);
    return noise * 0.5 - 1.0;
}

@fragment
fn fs_water(in: WaterOutput) -> @location(0) vec4<f32> {
    let size = frame.sun_color_size.w;
    let sun_color = frame.sun_color_size.rgb;
    let sun = frame.water_sun_time.xyz;
    let water_color = frame.water_color_alpha.rgb;
    let distortion_scale = frame.water_misc.x;

    let noise = get_noise(in.world_pos.xz * size);
    let surface_normal = normalize(noise.xzy * vec3<f32>(1.5, 1.0, 1.5));

    let world_to_eye = frame.eye_exposure.xyz - in.world_pos;
    let eye_dir = normalize(world_to_eye);
    let dist = length(world_to_eye);

    let sun_reflect = normalize(reflect(-sun, surface_normal));
    let specular = pow(max(0.0, dot(eye_dir, sun_reflect)), 100.0) * sun_color * 2.0;
    let diffuse = max(dot(sun, surface_normal), 0.0) * sun_color * 0.5;

    let distortion = surface_normal.xz * (0.001 + 1.0 / dist) * distortion_scale;
    let mirror_dir = reflect(-eye_dir, vec3<f32>(0.0, 1.0, 0.0));
    let reflection = env_radiance(normalize(mirror_dir + vec3<f32>(distortion.x, 0.0, distortion.y)), 0.0);

    let theta = max(dot(eye_dir, surface_normal), 0.0);
    let reflectance = 0.3 + 0.7 * pow(1.0 - theta, 5.0);
    let scatter = max(0.0, dot(surface_normal, eye_dir)) * water_color;

    var albedo = mix(
        sun_color * diffuse * 0.3 + scatter,
        vec3<f32>(0.1) + reflection * 0.9 + reflection * specular,
        reflectance,
    );

    let along = vec3<f32>(-eye_dir.x, 0.0, -eye_dir.z);
    if (frame.water_misc.z > 0.5 && dot(along, along) > 1e-8) {
        let f = 1.0 - exp(-dist * 1.0e-4);
        albedo = mix(albedo, sky_radiance(normalize(along)), f);
    }

    return vec4<f32>(aces_filmic(albedo, frame.eye_exposure.w), frame.water_color_alpha.w);
}
"#;

/// Island meshes: metallic-roughness materials lit only by the environment.
pub const MESH: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) base_color: vec4<f32>,
    // x metallic, y roughness
    @location(7) material: vec4<f32>,
};

struct MeshOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) base_color: vec4<f32>,
    @location(3) material: vec4<f32>,
};

@vertex
fn vs_mesh(vertex: VertexInput, instance: InstanceInput) -> MeshOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: MeshOutput;
    out.clip_position = frame.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.base_color = instance.base_color;
    out.material = instance.material;
    return out;
}

@fragment
fn fs_mesh(in: MeshOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    let v = normalize(frame.eye_exposure.xyz - in.world_pos);
    let base = in.base_color.rgb;
    let metallic = clamp(in.material.x, 0.0, 1.0);
    let roughness = clamp(in.material.y, 0.0, 1.0);

    let f0 = mix(vec3<f32>(0.04), base, metallic);
    let n_dot_v = max(dot(n, v), 0.0);
    let fresnel = f0 + (max(vec3<f32>(1.0 - roughness), f0) - f0) * pow(1.0 - n_dot_v, 5.0);

    let diffuse = (1.0 - fresnel) * (1.0 - metallic) * base * sh_irradiance(n) / PI;
    let specular = fresnel * env_radiance(reflect(-v, n), roughness);

    return vec4<f32>(aces_filmic(diffuse + specular, frame.eye_exposure.w), in.base_color.a);
}
"#;

/// Full source of one pass: the shared prelude followed by `pass`.
pub fn compose(pass: &str) -> String {
    format!("{COMMON}\n{pass}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_define_their_entry_points() {
        for (src, entries) in [
            (SKY, ["vs_sky", "fs_sky"]),
            (WATER, ["vs_water", "fs_water"]),
            (MESH, ["vs_mesh", "fs_mesh"]),
        ] {
            let full = compose(src);
            assert!(full.starts_with(COMMON));
            for entry in entries {
                assert!(full.contains(&format!("fn {entry}(")), "missing {entry}");
            }
        }
    }

    #[test]
    fn sh_evaluation_uses_nine_coefficients() {
        assert!(COMMON.contains("array<vec4<f32>, 9>"));
        assert!(COMMON.contains("sh.c[8]"));
    }
}
