/// WGSL shader for meshes and point clouds.
///
/// Group 0 holds the camera and lights, group 1 the per-node object block,
/// group 2 the color map (a white texel when the material has none).
pub const SCENE_SHADER: &str = r#"
const MAX_LIGHTS: u32 = 8u;

const LIGHT_DIRECTIONAL: u32 = 0u;
const LIGHT_POINT: u32 = 1u;
const LIGHT_HEMISPHERE: u32 = 2u;

const SHADING_BASIC: u32 = 0u;
const SHADING_STANDARD: u32 = 1u;
const SHADING_PHYSICAL: u32 = 2u;
const SHADING_TOON: u32 = 3u;

struct Light {
    // xyz: direction toward the light (directional, hemisphere up axis) or
    // world position (point). w: kind.
    vector: vec4<f32>,
    // rgb: color (sky color for hemisphere), a: intensity
    color: vec4<f32>,
    // rgb: hemisphere ground color, a: point light cutoff distance
    extra: vec4<f32>,
};

struct Scene {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    // x: light count
    params: vec4<u32>,
    lights: array<Light, MAX_LIGHTS>,
};

struct Object {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    // x: shading model, y: has color map
    params: vec4<u32>,
};

@group(0) @binding(0) var<uniform> scene: Scene;
@group(1) @binding(0) var<uniform> object: Object;
@group(2) @binding(0) var color_map: texture_2d<f32>;
@group(2) @binding(1) var color_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_pos = object.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = scene.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = (object.normal_matrix * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.uv = vertex.uv;
    return out;
}

fn light_dir(light: Light, pos: vec3<f32>) -> vec3<f32> {
    if light.vector.w == f32(LIGHT_POINT) {
        return normalize(light.vector.xyz - pos);
    }
    return normalize(light.vector.xyz);
}

fn attenuation(light: Light, pos: vec3<f32>) -> f32 {
    if light.vector.w != f32(LIGHT_POINT) || light.extra.a <= 0.0 {
        return 1.0;
    }
    let d = distance(light.vector.xyz, pos);
    return pow(clamp(1.0 - d / light.extra.a, 0.0, 1.0), 2.0);
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var base = object.color.rgb;
    if object.params.y != 0u {
        base = base * textureSample(color_map, color_sampler, in.uv).rgb;
    }
    let shading = object.params.x;
    if shading == SHADING_BASIC {
        return vec4<f32>(base, object.color.a);
    }

    var n = normalize(in.world_normal);
    if !front {
        n = -n;
    }
    let view = normalize(scene.camera_pos.xyz - in.world_pos);
    var diffuse = vec3<f32>(0.0);
    var specular = vec3<f32>(0.0);

    let count = min(scene.params.x, MAX_LIGHTS);
    for (var i = 0u; i < count; i = i + 1u) {
        let light = scene.lights[i];
        let intensity = light.color.a;
        if light.vector.w == f32(LIGHT_HEMISPHERE) {
            let w = dot(n, normalize(light.vector.xyz)) * 0.5 + 0.5;
            diffuse += mix(light.extra.rgb, light.color.rgb, w) * intensity;
            continue;
        }
        let l = light_dir(light, in.world_pos);
        var ndotl = max(dot(n, l), 0.0);
        if shading == SHADING_TOON {
            ndotl = select(0.3, 1.0, ndotl > 0.5) * select(0.0, 1.0, ndotl > 0.0) + 0.2;
        }
        let radiance = light.color.rgb * intensity * attenuation(light, in.world_pos);
        diffuse += radiance * ndotl;
        if shading == SHADING_PHYSICAL {
            let h = normalize(l + view);
            specular += radiance * pow(max(dot(n, h), 0.0), 64.0) * 0.25;
        }
    }

    // Irradiance to outgoing radiance for a Lambertian surface.
    let color = base * diffuse / 3.14159265 + specular;
    return vec4<f32>(color, object.color.a);
}

@vertex
fn vs_points(vertex: VertexInput) -> @builtin(position) vec4<f32> {
    return scene.view_proj * object.model * vec4<f32>(vertex.position, 1.0);
}

@fragment
fn fs_points() -> @location(0) vec4<f32> {
    return object.color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_points_present() {
        for entry in ["fn vs_main", "fn fs_main", "fn vs_points", "fn fs_points"] {
            assert!(SCENE_SHADER.contains(entry), "missing {entry}");
        }
    }

    #[test]
    fn light_array_matches_cpu_capacity() {
        assert!(SCENE_SHADER.contains(&format!("MAX_LIGHTS: u32 = {}u", crate::gpu::MAX_LIGHTS)));
    }
}
