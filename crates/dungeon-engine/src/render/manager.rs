use std::collections::HashMap;

use crate::atlas::TextureAtlas;
use crate::coords::{Color, Rect, Vec2};

use super::batch::{LayerBatcher, LayerDraw, VertexSink};
use super::common::{alpha_blend, layer_ubo_min_binding_size, LayerUniform};
use super::layer::{DrawLayer, LayerDesc, LayerId, Topology};
use super::texture::TextureStore;
use super::vertex::Vertex;
use super::{BufferRegion, RenderCtx, RenderTarget};

/// Layered vertex-streaming renderer.
///
/// All layers share one GPU vertex buffer, split into fixed regions at
/// construction. Draw requests during the frame land in the addressed layer's
/// region (see [`LayerBatcher`]); [`frame_update`](Self::frame_update) uploads
/// what changed and issues one draw call per layer, in configuration order, in
/// a single render pass. Later layers draw on top of earlier ones.
///
/// wgpu bakes topology into the pipeline, so one pipeline per [`Topology`] is
/// kept and switched per layer; layers are never merged even when adjacent
/// layers share a topology.
pub struct RenderManager {
    batcher: LayerBatcher,
    textures: TextureStore,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipelines: HashMap<Topology, wgpu::RenderPipeline>,
    uniform_bgl: Option<wgpu::BindGroupLayout>,
    texture_bgl: Option<wgpu::BindGroupLayout>,

    vertex_buffer: Option<wgpu::Buffer>,
    /// One uniform buffer + bind group per layer (screen layer last).
    layer_ubos: Vec<(wgpu::Buffer, wgpu::BindGroup)>,
}

impl RenderManager {
    /// Builds the layer table and arena. GPU resources are created lazily on
    /// the first frame.
    pub fn new(textures: TextureStore, layers: &[LayerDesc], screen: &LayerDesc) -> Self {
        Self {
            batcher: LayerBatcher::new(layers, screen),
            textures,
            pipeline_format: None,
            pipelines: HashMap::new(),
            uniform_bgl: None,
            texture_bgl: None,
            vertex_buffer: None,
            layer_ubos: Vec::new(),
        }
    }

    #[inline]
    pub fn batcher(&self) -> &LayerBatcher {
        &self.batcher
    }

    #[inline]
    pub fn layers(&self) -> &[DrawLayer] {
        self.batcher.layers()
    }

    #[inline]
    pub fn region(&self, id: LayerId) -> Option<BufferRegion> {
        self.batcher.region(id)
    }

    #[inline]
    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    #[inline]
    pub fn textures_mut(&mut self) -> &mut TextureStore {
        &mut self.textures
    }

    // ── consumer API ──────────────────────────────────────────────────────

    #[inline]
    pub fn draw_buffer(&mut self, vertices: &[Vertex], count: usize, layer: impl Into<LayerId>) -> usize {
        self.batcher.draw_buffer(vertices, count, layer.into())
    }

    #[inline]
    pub fn draw_line(&mut self, a: Vec2, b: Vec2, color: Color, layer: impl Into<LayerId>) -> usize {
        self.batcher.draw_line(a, b, color, layer.into())
    }

    #[inline]
    pub fn draw_rect(&mut self, rect: Rect, color: Color, layer: impl Into<LayerId>) -> usize {
        self.batcher.draw_rect(rect, color, layer.into())
    }

    #[inline]
    pub fn draw_textured_rect(
        &mut self,
        rect: Rect,
        tex: Rect,
        color: Color,
        layer: impl Into<LayerId>,
    ) -> usize {
        self.batcher.draw_textured_rect(rect, tex, color, layer.into())
    }

    #[inline]
    pub fn draw_sprite(
        &mut self,
        atlas: &TextureAtlas,
        name: &str,
        position: Vec2,
        color: Color,
        layer: impl Into<LayerId>,
    ) -> usize {
        self.batcher.draw_sprite(atlas, name, position, color, layer.into())
    }

    /// Rewinds a layer's region so static content can be rewritten.
    #[inline]
    pub fn reset_layer(&mut self, layer: impl Into<LayerId>) {
        self.batcher.reset_layer(layer.into());
    }

    /// Replaces vertices already written to `layer`, `offset` vertices into
    /// its region. Only the replaced range is uploaded on the next frame.
    #[inline]
    pub fn overwrite(&mut self, vertices: &[Vertex], offset: usize, layer: impl Into<LayerId>) -> usize {
        self.batcher.overwrite(vertices, offset, layer.into())
    }

    /// Ends a frame that will not be drawn: rewinds non-static regions as
    /// [`frame_update`](Self::frame_update) would.
    #[inline]
    pub fn discard_frame(&mut self) {
        self.batcher.discard_frame();
    }

    // ── flush ─────────────────────────────────────────────────────────────

    /// Uploads pending vertices/textures and draws every layer into `target`.
    ///
    /// Non-static regions are rewound afterwards. The view transform is derived
    /// from `ctx.viewport` on every call, so window resizes need no extra step.
    pub fn frame_update(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        self.ensure_pipelines(ctx);
        self.ensure_vertex_buffer(ctx);
        self.ensure_layer_uniforms(ctx);

        if let Some(bgl) = self.texture_bgl.as_ref() {
            self.textures.upload(ctx, bgl);
        }

        self.upload_dirty_vertices(ctx);

        let draws = self.batcher.flush(ctx.viewport);
        for (draw, (ubo, _)) in draws.iter().zip(self.layer_ubos.iter()) {
            let u = LayerUniform::new(ctx.viewport, draw.transform);
            ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
        }

        self.encode(target, &draws);
    }

    fn encode(&self, target: &mut RenderTarget<'_>, draws: &[LayerDraw]) {
        let Some(vbo) = self.vertex_buffer.as_ref() else { return };

        let load = target.take_load_op();
        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("dungeon layer pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_vertex_buffer(0, vbo.slice(..));

        for (draw, (_, ubo_bind_group)) in draws.iter().zip(self.layer_ubos.iter()) {
            if draw.vertices.is_empty() {
                continue;
            }
            let Some(pipeline) = self.pipelines.get(&draw.topology) else { continue };
            let texture = draw.texture.unwrap_or_else(|| self.textures.white());
            let Some(texture_bind_group) = self.textures.bind_group(texture) else { continue };

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, ubo_bind_group, &[]);
            rpass.set_bind_group(1, texture_bind_group, &[]);
            rpass.draw(draw.vertices.clone(), 0..1);
        }
    }

    fn upload_dirty_vertices(&mut self, ctx: &RenderCtx<'_>) {
        let Some(vbo) = self.vertex_buffer.as_ref() else { return };
        let Some(range) = self.batcher.arena_mut().take_dirty() else { return };

        let stride = std::mem::size_of::<Vertex>();
        let data = &self.batcher.arena().as_slice()[range.clone()];
        ctx.queue
            .write_buffer(vbo, (range.start * stride) as u64, bytemuck::cast_slice(data));
    }

    // ── lazy-init helpers ─────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && !self.pipelines.is_empty() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("dungeon layer shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/layer.wgsl").into()),
        });

        let uniform_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("dungeon layer uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(layer_ubo_min_binding_size()),
                },
                count: None,
            }],
        });

        let texture_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("dungeon layer texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("dungeon layer pipeline layout"),
            bind_group_layouts: &[&uniform_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let mut pipelines = HashMap::with_capacity(Topology::ALL.len());
        for topology in Topology::ALL {
            let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("dungeon layer pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[Vertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: topology.to_wgpu(),
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });
            pipelines.insert(topology, pipeline);
        }

        log::debug!("RenderManager: built {} pipelines for {:?}", pipelines.len(), ctx.surface_format);

        self.pipeline_format = Some(ctx.surface_format);
        self.pipelines = pipelines;
        self.uniform_bgl = Some(uniform_bgl);
        self.texture_bgl = Some(texture_bgl);

        // Bind groups reference the old layouts.
        self.layer_ubos.clear();
        self.textures.invalidate_gpu();
    }

    fn ensure_vertex_buffer(&mut self, ctx: &RenderCtx<'_>) {
        if self.vertex_buffer.is_some() {
            return;
        }
        let capacity = self.batcher.arena().capacity();
        if capacity == 0 {
            return;
        }

        let size = (capacity * std::mem::size_of::<Vertex>()) as u64;
        self.vertex_buffer = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("dungeon shared vertex buffer"),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));

        // A fresh buffer holds nothing; static regions written earlier must
        // go up too.
        self.batcher.arena_mut().mark_written_dirty();

        log::info!("RenderManager: allocated shared vertex buffer ({capacity} vertices, {size} bytes)");
    }

    fn ensure_layer_uniforms(&mut self, ctx: &RenderCtx<'_>) {
        let needed = self.batcher.layers().len() + 1;
        if self.layer_ubos.len() == needed {
            return;
        }
        let Some(bgl) = self.uniform_bgl.as_ref() else { return };

        self.layer_ubos = (0..needed)
            .map(|_| {
                let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("dungeon layer ubo"),
                    size: std::mem::size_of::<LayerUniform>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("dungeon layer ubo bind group"),
                    layout: bgl,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: ubo.as_entire_binding(),
                    }],
                });
                (ubo, bind_group)
            })
            .collect();
    }
}

impl VertexSink for RenderManager {
    #[inline]
    fn layer_count(&self) -> usize {
        self.batcher.layers().len()
    }

    #[inline]
    fn draw_buffer(&mut self, vertices: &[Vertex], count: usize, layer: LayerId) -> usize {
        self.batcher.draw_buffer(vertices, count, layer)
    }
}
