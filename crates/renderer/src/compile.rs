use std::borrow::Cow;

use wgpu::naga::ShaderStage;

/// Grid-warp fragment body, written against the carousel uniform names.
const CAROUSEL_FRAGMENT: &str = include_str!("shaders/carousel.frag");

/// Names the wrapper provides itself; declarations of them in the body are
/// dropped.
const PROVIDED_UNIFORMS: [&str; 12] = carousel::UNIFORM_NAMES;

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Wraps the bundled carousel shader with the uniform prelude and compiles it.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    let wrapped = wrap_carousel_fragment(CAROUSEL_FRAGMENT);
    tracing::debug!(bytes = wrapped.len(), "compiling carousel fragment shader");
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("carousel fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrapped),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Produces a self-contained GLSL fragment shader from a `mainImage` body.
///
/// The body may carry its own `#version` line and plain `uniform`
/// declarations of the carousel names (handy for editor tooling); both are
/// stripped and replaced by [`HEADER`], which binds the std140 block and the
/// texture/sampler pairs. [`FOOTER`] calls `mainImage` with the pixel
/// coordinate (top-left origin) and writes an opaque color.
pub(crate) fn wrap_carousel_fragment(source: &str) -> String {
    let mut sanitized = String::with_capacity(source.len());
    let mut skipped_version = false;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if !skipped_version && trimmed.starts_with("#version") {
            skipped_version = true;
            continue;
        }
        if declares_provided_uniform(trimmed) {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }

    format!("{HEADER}\n#line 1\n{sanitized}{FOOTER}")
}

fn declares_provided_uniform(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("uniform ") else {
        return false;
    };
    rest.trim_end_matches(';')
        .split_whitespace()
        .last()
        .and_then(|name| name.split('[').next())
        .is_some_and(|name| PROVIDED_UNIFORMS.contains(&name))
}

/// GLSL prologue injected ahead of the carousel shader.
///
/// The uniform block layout must match `CarouselUniforms` in `gpu/uniforms.rs`.
const HEADER: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform CarouselParams {
    vec2 _uResolution;
    vec2 _uGridSize;
    vec2 _uTexture0Size;
    vec2 _uTexture1Size;
    vec4 _uBackground0[2];
    vec4 _uBackground1[2];
    float _uProgress;
    float _uTime;
    float _uAnimationDirection;
    float _padding0;
} params;

#define uResolution params._uResolution
#define uGridSize params._uGridSize
#define uTexture0Size params._uTexture0Size
#define uTexture1Size params._uTexture1Size
#define uBackground0 params._uBackground0
#define uBackground1 params._uBackground1
#define uProgress params._uProgress
#define uTime params._uTime
#define uAnimationDirection params._uAnimationDirection

layout(set = 1, binding = 0) uniform texture2D gridwarp_texture0;
layout(set = 1, binding = 1) uniform sampler gridwarp_sampler0;
layout(set = 1, binding = 2) uniform texture2D gridwarp_texture1;
layout(set = 1, binding = 3) uniform sampler gridwarp_sampler1;
layout(set = 1, binding = 4) uniform texture2D gridwarp_noise;
layout(set = 1, binding = 5) uniform sampler gridwarp_noise_sampler;

#define uTexture0 sampler2D(gridwarp_texture0, gridwarp_sampler0)
#define uTexture1 sampler2D(gridwarp_texture1, gridwarp_sampler1)
#define uNoiseTexture sampler2D(gridwarp_noise, gridwarp_noise_sampler)
";

const FOOTER: &str = r"
void main() {
    vec4 color = vec4(0.0);
    mainImage(color, gl_FragCoord.xy);
    outColor = vec4(color.rgb, 1.0);
}
";

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    vec2 pos = positions[uint(gl_VertexIndex)];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_strips_version_and_contract_uniforms() {
        let source = r#"
            #version 450
            uniform float uProgress;
            uniform sampler2D uTexture0;
            uniform vec4 uBackground1[2];
            uniform float uCustom;
            void mainImage(out vec4 fragColor, in vec2 fragCoord) {
                fragColor = texture(uTexture0, fragCoord / uResolution);
            }
        "#;

        let wrapped = wrap_carousel_fragment(source);
        assert_eq!(wrapped.matches("#version").count(), 1);
        assert!(!wrapped.contains("uniform float uProgress"));
        assert!(!wrapped.contains("uniform sampler2D uTexture0"));
        assert!(!wrapped.contains("uniform vec4 uBackground1[2]"));
        assert!(wrapped.contains("uniform float uCustom"));
        assert!(wrapped.contains("mainImage(color, gl_FragCoord.xy)"));
    }

    #[test]
    fn header_defines_every_uniform_name() {
        for name in carousel::UNIFORM_NAMES {
            assert!(
                HEADER.contains(&format!("#define {name} ")),
                "{name} is not provided by the prelude"
            );
        }
    }

    #[test]
    fn bundled_shader_uses_only_provided_names() {
        let wrapped = wrap_carousel_fragment(CAROUSEL_FRAGMENT);
        assert!(wrapped.contains("void mainImage"));
        assert!(!wrapped
            .lines()
            .skip(HEADER.lines().count())
            .any(|line| line.trim_start().starts_with("uniform ")));
    }
}
