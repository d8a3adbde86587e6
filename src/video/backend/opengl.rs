//!
//! OpenGL rendering backend.

use std::collections::HashMap;
use std::ffi::CString;

use log::{info, warn};
use sdl2::{
    video::{FullscreenType, GLContext, GLProfile},
    Sdl, VideoSubsystem,
};

use crate::config::VideoOptions;
use crate::error::{VideoError, VideoResult};
use crate::math::Rectf;
use crate::video::backend::glutil::assert_gl;
use crate::video::backend::{RenderBackend, TextureQuad};
use crate::video::color::{Blend, BlendFactor, Color};
use crate::video::texture::{SavedTexture, TextureId};

#[derive(Copy, Clone)]
#[repr(C)]
struct Vertex {
    pos: [f32; 2],
    tex: [f32; 2],
    color: [f32; 4],
}

const VERT_SHADER_SRC: &str = "\
    attribute vec2 a_pos;\
    attribute vec2 a_tex;\
    attribute vec4 a_color;\
    uniform vec2 u_screen;\
    varying vec2 v_tex;\
    varying vec4 v_color;\
    void main() {\
        v_tex = a_tex;\
        v_color = a_color;\
        vec2 ndc = a_pos / u_screen * vec2(2.0, -2.0) + vec2(-1.0, 1.0);\
        gl_Position = vec4(ndc, 0.0, 1.0);\
    }\
";

const FRAG_SHADER_SRC: &str = "\
    #ifdef GL_ES\
    precision mediump float;\
    #endif\
    varying vec2 v_tex;\
    varying vec4 v_color;\
    uniform sampler2D u_tex;\
    void main() {\
        gl_FragColor = texture2D(u_tex, v_tex) * v_color;\
    }\
";

fn blend_factor_gl(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => gl::ZERO,
        BlendFactor::One => gl::ONE,
        BlendFactor::SrcAlpha => gl::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstColor => gl::DST_COLOR,
    }
}

pub struct GlBackend {
    _sdl_context: Sdl,
    _video_subsystem: VideoSubsystem,
    window: sdl2::video::Window,
    _gl_context: GLContext,
    screen_width: u32,
    screen_height: u32,
    shader_program: u32,
    vertex_buffer: u32,
    screen_uniform: i32,
    /// 1x1 white texture bound for untextured quads (gradients, fills).
    white_texture: u32,
    textures: HashMap<u32, (u32, u32)>,
    /// Lightmap pass dimensions while one is open.
    lightmap_pass: Option<(u32, u32)>,
    linear_filtering: bool,
}

// SAFETY: the SDL window and GL context are only ever touched from the
// thread that owns the backend lock; SDL's types are not Sync but the
// Mutex around the backend serializes all access.
unsafe impl Send for GlBackend {}

impl GlBackend {
    pub fn new(options: &VideoOptions) -> VideoResult<Self> {
        let sdl_context = sdl2::init()
            .map_err(|e| VideoError::Backend(format!("SDL2 init: {e}")))?;
        let video_subsystem = sdl_context
            .video()
            .map_err(|e| VideoError::Backend(format!("video subsystem: {e}")))?;

        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(GLProfile::GLES);
        gl_attr.set_context_version(2, 0);
        gl_attr.set_depth_size(0);
        gl_attr.set_double_buffer(true);

        let mut window = video_subsystem
            .window(&options.title, options.window_width, options.window_height)
            .opengl()
            .position_centered()
            .build()
            .map_err(|e| VideoError::Backend(format!("window creation: {e}")))?;

        if options.fullscreen {
            window
                .set_fullscreen(FullscreenType::Desktop)
                .map_err(|e| VideoError::Backend(format!("set fullscreen: {e}")))?;
        }

        let gl_context = window
            .gl_create_context()
            .map_err(|e| VideoError::Backend(format!("GL context: {e}")))?;
        window
            .gl_make_current(&gl_context)
            .map_err(|e| VideoError::Backend(format!("make current: {e}")))?;

        gl::load_with(|s| video_subsystem.gl_get_proc_address(s) as *const _);

        unsafe {
            gl::Disable(gl::DEPTH_TEST);
            gl::Disable(gl::DITHER);
            gl::Enable(gl::BLEND);
            gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::ClearColor(0.0, 0.0, 0.0, 1.0);
        }

        let mut backend = Self {
            _sdl_context: sdl_context,
            _video_subsystem: video_subsystem,
            window,
            _gl_context: gl_context,
            screen_width: options.screen_width,
            screen_height: options.screen_height,
            shader_program: 0,
            vertex_buffer: 0,
            screen_uniform: -1,
            white_texture: 0,
            textures: HashMap::new(),
            lightmap_pass: None,
            linear_filtering: options.linear_filtering,
        };
        backend.init_shaders()?;
        backend.init_buffers();
        backend.init_white_texture();
        backend.update_viewport();
        assert_gl("backend initialization");

        info!(
            "OpenGL renderer ready, {}x{} logical in a {}x{} window",
            options.screen_width, options.screen_height, options.window_width,
            options.window_height
        );
        Ok(backend)
    }

    fn init_shaders(&mut self) -> VideoResult<()> {
        let vertex_shader = Self::compile_shader(gl::VERTEX_SHADER, VERT_SHADER_SRC)?;
        let fragment_shader = Self::compile_shader(gl::FRAGMENT_SHADER, FRAG_SHADER_SRC)?;
        let program = unsafe { gl::CreateProgram() };

        unsafe {
            gl::AttachShader(program, vertex_shader);
            gl::AttachShader(program, fragment_shader);
            gl::BindAttribLocation(program, 0, b"a_pos\0".as_ptr().cast());
            gl::BindAttribLocation(program, 1, b"a_tex\0".as_ptr().cast());
            gl::BindAttribLocation(program, 2, b"a_color\0".as_ptr().cast());
            gl::LinkProgram(program);
        }

        let mut link_status = 0;
        unsafe {
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut link_status);
        }
        if link_status == 0 {
            let log = Self::program_info_log(program);
            unsafe {
                gl::DeleteProgram(program);
                gl::DeleteShader(vertex_shader);
                gl::DeleteShader(fragment_shader);
            }
            return Err(VideoError::Backend(format!("shader link failed: {log}")));
        }

        unsafe {
            gl::DetachShader(program, vertex_shader);
            gl::DetachShader(program, fragment_shader);
            gl::DeleteShader(vertex_shader);
            gl::DeleteShader(fragment_shader);
            gl::UseProgram(program);
            let sampler_location = gl::GetUniformLocation(program, b"u_tex\0".as_ptr().cast());
            if sampler_location >= 0 {
                gl::Uniform1i(sampler_location, 0);
            }
            self.screen_uniform =
                gl::GetUniformLocation(program, b"u_screen\0".as_ptr().cast());
            gl::Uniform2f(
                self.screen_uniform,
                self.screen_width as f32,
                self.screen_height as f32,
            );
        }

        self.shader_program = program;
        Ok(())
    }

    fn compile_shader(shader_type: u32, source: &str) -> VideoResult<u32> {
        let shader = unsafe { gl::CreateShader(shader_type) };
        let c_str = CString::new(source)
            .map_err(|e| VideoError::Backend(format!("shader source contains null: {e}")))?;

        unsafe {
            gl::ShaderSource(shader, 1, &c_str.as_ptr(), std::ptr::null());
            gl::CompileShader(shader);
        }

        let mut status = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
        }
        if status == 0 {
            let log = Self::shader_info_log(shader);
            unsafe {
                gl::DeleteShader(shader);
            }
            return Err(VideoError::Backend(format!("shader compile failed: {log}")));
        }

        Ok(shader)
    }

    fn shader_info_log(shader: u32) -> String {
        let mut len = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
        }
        if len <= 1 {
            return String::new();
        }

        let mut buffer = vec![0u8; len as usize];
        unsafe {
            gl::GetShaderInfoLog(shader, len, std::ptr::null_mut(), buffer.as_mut_ptr().cast());
        }
        String::from_utf8_lossy(&buffer)
            .trim_end_matches('\0')
            .to_string()
    }

    fn program_info_log(program: u32) -> String {
        let mut len = 0;
        unsafe {
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
        }
        if len <= 1 {
            return String::new();
        }

        let mut buffer = vec![0u8; len as usize];
        unsafe {
            gl::GetProgramInfoLog(program, len, std::ptr::null_mut(), buffer.as_mut_ptr().cast());
        }
        String::from_utf8_lossy(&buffer)
            .trim_end_matches('\0')
            .to_string()
    }

    fn init_buffers(&mut self) {
        unsafe {
            gl::GenBuffers(1, &mut self.vertex_buffer);
        }
    }

    fn init_white_texture(&mut self) {
        let pixels: [u8; 4] = [255, 255, 255, 255];
        unsafe {
            gl::GenTextures(1, &mut self.white_texture);
            gl::BindTexture(gl::TEXTURE_2D, self.white_texture);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as i32);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as i32,
                1,
                1,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                pixels.as_ptr().cast(),
            );
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
    }

    fn update_viewport(&self) {
        let (window_width, window_height) = self.window.drawable_size();
        unsafe {
            gl::Viewport(0, 0, window_width as i32, window_height as i32);
        }
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
        linear_filter: bool,
        clamp: bool,
    ) -> TextureId {
        let filter = if linear_filter { gl::LINEAR } else { gl::NEAREST };
        let wrap = if clamp { gl::CLAMP_TO_EDGE } else { gl::REPEAT };
        let mut handle = 0;
        unsafe {
            gl::GenTextures(1, &mut handle);
            gl::BindTexture(gl::TEXTURE_2D, handle);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, filter as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, filter as i32);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as i32,
                width as i32,
                height as i32,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                pixels.map_or(std::ptr::null(), |p| p.as_ptr().cast()),
            );
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
        assert_gl("texture creation");
        self.textures.insert(handle, (width, height));
        TextureId::new(handle)
    }

    fn set_blend(&self, blend: Blend) {
        unsafe {
            gl::BlendFunc(blend_factor_gl(blend.sfactor), blend_factor_gl(blend.dfactor));
        }
    }

    /// Draw one quad. Corner order: top-left, top-right, bottom-left,
    /// bottom-right (triangle strip).
    fn draw_quad(&self, handle: u32, corners: [[f32; 2]; 4], uvs: [[f32; 2]; 4], color: Color) {
        let rgba = [color.red, color.green, color.blue, color.alpha];
        let vertices: [Vertex; 4] = [
            Vertex { pos: corners[0], tex: uvs[0], color: rgba },
            Vertex { pos: corners[1], tex: uvs[1], color: rgba },
            Vertex { pos: corners[2], tex: uvs[2], color: rgba },
            Vertex { pos: corners[3], tex: uvs[3], color: rgba },
        ];
        unsafe {
            gl::UseProgram(self.shader_program);
            gl::ActiveTexture(gl::TEXTURE0);
            gl::BindTexture(gl::TEXTURE_2D, handle);
            gl::BindBuffer(gl::ARRAY_BUFFER, self.vertex_buffer);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                std::mem::size_of_val(&vertices) as isize,
                vertices.as_ptr().cast(),
                gl::DYNAMIC_DRAW,
            );
            let stride = std::mem::size_of::<Vertex>() as i32;
            gl::EnableVertexAttribArray(0);
            gl::VertexAttribPointer(0, 2, gl::FLOAT, gl::FALSE, stride, std::ptr::null());
            gl::EnableVertexAttribArray(1);
            gl::VertexAttribPointer(
                1,
                2,
                gl::FLOAT,
                gl::FALSE,
                stride,
                (std::mem::size_of::<f32>() * 2) as *const _,
            );
            gl::EnableVertexAttribArray(2);
            gl::VertexAttribPointer(
                2,
                4,
                gl::FLOAT,
                gl::FALSE,
                stride,
                (std::mem::size_of::<f32>() * 4) as *const _,
            );
            gl::DrawArrays(gl::TRIANGLE_STRIP, 0, 4);
            gl::DisableVertexAttribArray(0);
            gl::DisableVertexAttribArray(1);
            gl::DisableVertexAttribArray(2);
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
    }

    fn quad_corners(dst: Rectf, angle: f32) -> [[f32; 2]; 4] {
        let left = dst.pos.x;
        let top = dst.pos.y;
        let right = left + dst.size.width;
        let bottom = top + dst.size.height;
        if angle == 0.0 {
            return [[left, top], [right, top], [left, bottom], [right, bottom]];
        }

        // Rotate around the destination center, screen-space degrees.
        let center_x = left + dst.size.width / 2.0;
        let center_y = top + dst.size.height / 2.0;
        let radians = angle.to_radians();
        let (sin, cos) = radians.sin_cos();
        let rotate = |x: f32, y: f32| {
            let dx = x - center_x;
            let dy = y - center_y;
            [
                center_x + dx * cos - dy * sin,
                center_y + dx * sin + dy * cos,
            ]
        };
        [
            rotate(left, top),
            rotate(right, top),
            rotate(left, bottom),
            rotate(right, bottom),
        ]
    }
}

impl RenderBackend for GlBackend {
    fn name(&self) -> &'static str {
        "opengl"
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    fn upload_texture(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> VideoResult<TextureId> {
        let expected = (width * height * 4) as usize;
        if pixels.len() != expected {
            return Err(VideoError::Backend(format!(
                "texture upload of {}x{} expected {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(self.create_texture(width, height, Some(pixels), self.linear_filtering, true))
    }

    fn allocate_texture(&mut self, width: u32, height: u32) -> VideoResult<TextureId> {
        Ok(self.create_texture(width, height, None, self.linear_filtering, true))
    }

    fn download_texture(&mut self, id: TextureId) -> VideoResult<SavedTexture> {
        let (width, height) = self
            .textures
            .get(&id.id())
            .copied()
            .ok_or(VideoError::UnknownTexture(id.id()))?;
        let mut pixels = vec![0u8; (width * height * 4) as usize];
        let mut filter = 0;
        let mut wrap = 0;
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, id.id());
            gl::GetTexParameteriv(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, &mut filter);
            gl::GetTexParameteriv(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, &mut wrap);
            gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
            gl::GetTexImage(
                gl::TEXTURE_2D,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                pixels.as_mut_ptr().cast(),
            );
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
        assert_gl("texture download");
        Ok(SavedTexture {
            pixels,
            width,
            height,
            linear_filter: filter == gl::LINEAR as i32,
            clamp: wrap == gl::CLAMP_TO_EDGE as i32,
        })
    }

    fn restore_texture(&mut self, saved: &SavedTexture) -> VideoResult<TextureId> {
        Ok(self.create_texture(
            saved.width,
            saved.height,
            Some(&saved.pixels),
            saved.linear_filter,
            saved.clamp,
        ))
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id.id()).is_some() {
            unsafe {
                gl::DeleteTextures(1, &id.id());
            }
        }
    }

    fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    fn draw_texture(&mut self, id: TextureId, quad: &TextureQuad) {
        let Some(&(tex_width, tex_height)) = self.textures.get(&id.id()) else {
            warn!("unknown texture {}, skipping draw", id.id());
            return;
        };

        let mut u0 = quad.src.pos.x / tex_width as f32;
        let mut u1 = (quad.src.pos.x + quad.src.size.width) / tex_width as f32;
        let mut v0 = quad.src.pos.y / tex_height as f32;
        let mut v1 = (quad.src.pos.y + quad.src.size.height) / tex_height as f32;
        if quad.hflip {
            std::mem::swap(&mut u0, &mut u1);
        }
        if quad.vflip {
            std::mem::swap(&mut v0, &mut v1);
        }

        let color = Color::new(
            quad.color.red,
            quad.color.green,
            quad.color.blue,
            quad.color.alpha * quad.alpha,
        );
        self.set_blend(quad.blend);
        self.draw_quad(
            id.id(),
            Self::quad_corners(quad.dst, quad.angle),
            [[u0, v0], [u1, v0], [u0, v1], [u1, v1]],
            color,
        );
        self.set_blend(Blend::default());
        assert_gl("textured quad");
    }

    fn draw_gradient(&mut self, top: Color, bottom: Color) {
        let width = self.screen_width as f32;
        let height = self.screen_height as f32;
        let rgba = |c: Color| [c.red, c.green, c.blue, c.alpha];
        let vertices: [Vertex; 4] = [
            Vertex { pos: [0.0, 0.0], tex: [0.0, 0.0], color: rgba(top) },
            Vertex { pos: [width, 0.0], tex: [1.0, 0.0], color: rgba(top) },
            Vertex { pos: [0.0, height], tex: [0.0, 1.0], color: rgba(bottom) },
            Vertex { pos: [width, height], tex: [1.0, 1.0], color: rgba(bottom) },
        ];
        unsafe {
            gl::UseProgram(self.shader_program);
            gl::ActiveTexture(gl::TEXTURE0);
            gl::BindTexture(gl::TEXTURE_2D, self.white_texture);
            gl::BindBuffer(gl::ARRAY_BUFFER, self.vertex_buffer);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                std::mem::size_of_val(&vertices) as isize,
                vertices.as_ptr().cast(),
                gl::DYNAMIC_DRAW,
            );
            let stride = std::mem::size_of::<Vertex>() as i32;
            gl::EnableVertexAttribArray(0);
            gl::VertexAttribPointer(0, 2, gl::FLOAT, gl::FALSE, stride, std::ptr::null());
            gl::EnableVertexAttribArray(1);
            gl::VertexAttribPointer(
                1,
                2,
                gl::FLOAT,
                gl::FALSE,
                stride,
                (std::mem::size_of::<f32>() * 2) as *const _,
            );
            gl::EnableVertexAttribArray(2);
            gl::VertexAttribPointer(
                2,
                4,
                gl::FLOAT,
                gl::FALSE,
                stride,
                (std::mem::size_of::<f32>() * 4) as *const _,
            );
            gl::DrawArrays(gl::TRIANGLE_STRIP, 0, 4);
            gl::DisableVertexAttribArray(0);
            gl::DisableVertexAttribArray(1);
            gl::DisableVertexAttribArray(2);
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
        assert_gl("gradient");
    }

    fn fill_rect(&mut self, rect: Rectf, color: Color) {
        self.draw_quad(
            self.white_texture,
            Self::quad_corners(rect, 0.0),
            [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            color,
        );
        assert_gl("fill rect");
    }

    fn begin_lightmap(&mut self, width: u32, height: u32, ambient: Color) {
        let (_, window_height) = self.window.drawable_size();
        unsafe {
            gl::Viewport(
                0,
                window_height as i32 - height as i32,
                width as i32,
                height as i32,
            );
            gl::ClearColor(ambient.red, ambient.green, ambient.blue, 1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
        self.lightmap_pass = Some((width, height));
        assert_gl("lightmap begin");
    }

    fn finish_lightmap(&mut self, target: TextureId, width: u32, height: u32) {
        let (_, window_height) = self.window.drawable_size();
        unsafe {
            gl::Disable(gl::BLEND);
            gl::BindTexture(gl::TEXTURE_2D, target.id());
            gl::CopyTexSubImage2D(
                gl::TEXTURE_2D,
                0,
                0,
                0,
                0,
                window_height as i32 - height as i32,
                width as i32,
                height as i32,
            );
            gl::BindTexture(gl::TEXTURE_2D, 0);
            gl::Enable(gl::BLEND);
            gl::ClearColor(0.0, 0.0, 0.0, 1.0);
        }
        self.lightmap_pass = None;
        self.update_viewport();
        assert_gl("lightmap finish");
    }

    fn composite_lightmap(&mut self, id: TextureId, uv_right: f32, uv_bottom: f32) {
        let width = self.screen_width as f32;
        let height = self.screen_height as f32;
        unsafe {
            gl::BlendFunc(gl::DST_COLOR, gl::ZERO);
        }
        // The copied framebuffer region is bottom-up, so V runs from
        // uv_bottom at the top of the screen down to zero.
        self.draw_quad(
            id.id(),
            [[0.0, 0.0], [width, 0.0], [0.0, height], [width, height]],
            [
                [0.0, uv_bottom],
                [uv_right, uv_bottom],
                [0.0, 0.0],
                [uv_right, 0.0],
            ],
            Color::WHITE,
        );
        self.set_blend(Blend::default());
        assert_gl("lightmap composite");
    }

    fn read_pixel(&mut self, x: f32, y: f32) -> Color {
        let (window_width, window_height) = self.window.drawable_size();
        let (px, py) = match self.lightmap_pass {
            Some((lm_width, lm_height)) => (
                (x * lm_width as f32 / self.screen_width as f32) as i32,
                window_height as i32
                    - (y * lm_height as f32 / self.screen_height as f32) as i32,
            ),
            None => (
                (x * window_width as f32 / self.screen_width as f32) as i32,
                window_height as i32
                    - (y * window_height as f32 / self.screen_height as f32) as i32,
            ),
        };
        let mut pixel: [f32; 3] = [0.0; 3];
        unsafe {
            gl::ReadPixels(
                px,
                py,
                1,
                1,
                gl::RGB,
                gl::FLOAT,
                pixel.as_mut_ptr().cast(),
            );
        }
        assert_gl("read pixel");
        Color::rgb(pixel[0], pixel[1], pixel[2])
    }

    fn reconfigure(&mut self, options: &VideoOptions) -> VideoResult<()> {
        options.validate()?;
        self.window
            .set_size(options.window_width, options.window_height)
            .map_err(|e| VideoError::ModeChange(format!("set window size: {e}")))?;
        let mode = if options.fullscreen {
            FullscreenType::Desktop
        } else {
            FullscreenType::Off
        };
        self.window
            .set_fullscreen(mode)
            .map_err(|e| VideoError::ModeChange(format!("set fullscreen: {e}")))?;

        self.screen_width = options.screen_width;
        self.screen_height = options.screen_height;
        self.linear_filtering = options.linear_filtering;
        unsafe {
            gl::UseProgram(self.shader_program);
            gl::Uniform2f(
                self.screen_uniform,
                self.screen_width as f32,
                self.screen_height as f32,
            );
        }
        self.update_viewport();
        assert_gl("mode change");
        Ok(())
    }

    fn present(&mut self) {
        self.window.gl_swap_window();
        unsafe {
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }
}

impl Drop for GlBackend {
    fn drop(&mut self) {
        if !self.textures.is_empty() {
            let handles: Vec<u32> = self.textures.keys().copied().collect();
            unsafe {
                gl::DeleteTextures(handles.len() as i32, handles.as_ptr());
            }
            self.textures.clear();
        }
        if self.white_texture != 0 {
            unsafe {
                gl::DeleteTextures(1, &self.white_texture);
            }
        }
        if self.vertex_buffer != 0 {
            unsafe {
                gl::DeleteBuffers(1, &self.vertex_buffer);
            }
        }
        if self.shader_program != 0 {
            unsafe {
                gl::DeleteProgram(self.shader_program);
            }
        }
    }
}
