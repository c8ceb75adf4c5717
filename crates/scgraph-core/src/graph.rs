//! Owned snapshot of a builder's nodes and the structural rewrites applied
//! before sorting.
//!
//! The snapshot is an arena: nodes are addressed by [`NodeId`] slot and never
//! move, while `order` lists the live nodes. Rewrites append new nodes to the
//! arena and splice them into `order`.

use crate::error::{CodecError, SynthDefError};
use crate::kind::{PvRole, UGenKind};
use crate::rate::{CalculationRate, ParameterRate};
use crate::system::{
    AUDIO_CONTROL, BUF_FRAMES, CONTROL, LAG_CONTROL, LOCAL_BUF, MAX_LOCAL_BUFS, PV_COPY,
    TRIG_CONTROL,
};
use crate::ugen::{InputKey, NodeId, OutputProxy, Parameter, Payload, ScopeId, UGen, UGenScalar};

pub(crate) struct Snapshot {
    pub(crate) scope: ScopeId,
    pub(crate) arena: Vec<UGen>,
    pub(crate) order: Vec<NodeId>,
}

impl Snapshot {
    pub(crate) fn new(scope: ScopeId, arena: Vec<UGen>) -> Self {
        let order = (0..arena.len()).map(NodeId::from_slot).collect();
        Self {
            scope,
            arena,
            order,
        }
    }

    fn ugen(&self, id: NodeId) -> &UGen {
        &self.arena[id.slot()]
    }

    fn position(&self, id: NodeId) -> usize {
        self.order
            .iter()
            .position(|&entry| entry == id)
            .unwrap_or(self.order.len())
    }

    /// Appends a node to the arena without placing it in `order`.
    fn push(
        &mut self,
        kind: &'static UGenKind,
        rate: CalculationRate,
        inputs: Vec<(InputKey, UGenScalar)>,
    ) -> NodeId {
        let id = NodeId::from_slot(self.arena.len());
        let (input_keys, inputs) = inputs.into_iter().unzip();
        self.arena.push(UGen {
            kind,
            rate,
            special_index: 0,
            inputs,
            input_keys,
            output_count: kind.channel_count,
            scope: self.scope,
            payload: Payload::None,
        });
        id
    }

    fn output(&self, id: NodeId) -> UGenScalar {
        UGenScalar::Output(OutputProxy {
            scope: self.scope,
            node: id,
            index: 0,
            rate: self.ugen(id).rate,
        })
    }

    /// Replaces parameter placeholders with one Control-family node per rate
    /// class and points every parameter reference at its Control slot.
    ///
    /// Groups are emitted scalar, trigger, audio, control; parameters inside
    /// a group are sorted by name. Special indices are running offsets into
    /// the combined control vector.
    pub(crate) fn materialize_controls(&mut self) -> Result<(), SynthDefError> {
        let mut parameters: Vec<(NodeId, Parameter)> = self
            .order
            .iter()
            .filter_map(|&id| self.ugen(id).parameter().map(|p| (id, p.clone())))
            .collect();
        parameters.sort_by(|a, b| a.1.name.cmp(&b.1.name));

        let mut remap: Vec<Option<(NodeId, u32)>> = vec![None; self.arena.len()];
        let mut controls = Vec::new();
        let mut offset = 0usize;

        for rate in ParameterRate::ALL {
            let group: Vec<&(NodeId, Parameter)> =
                parameters.iter().filter(|(_, p)| p.rate == rate).collect();
            if group.is_empty() {
                continue;
            }
            let kind = match rate {
                ParameterRate::Scalar => &CONTROL,
                ParameterRate::Trigger => &TRIG_CONTROL,
                ParameterRate::Audio => &AUDIO_CONTROL,
                ParameterRate::Control if group.iter().any(|(_, p)| p.has_lag()) => &LAG_CONTROL,
                ParameterRate::Control => &CONTROL,
            };
            let width: usize = group.iter().map(|(_, p)| p.len()).sum();
            let special_index =
                u16::try_from(offset).map_err(|_| CodecError::SpecialIndexOutOfRange {
                    ugen: kind.name,
                    index: offset,
                })?;

            let mut inputs = Vec::new();
            let mut input_keys = Vec::new();
            if *kind == LAG_CONTROL {
                for (_, parameter) in &group {
                    let lag = parameter.lag.unwrap_or(0.0);
                    for _ in 0..parameter.len() {
                        input_keys.push(InputKey::Indexed("lags", inputs.len()));
                        inputs.push(UGenScalar::Constant(lag));
                    }
                }
            }

            let id = NodeId::from_slot(self.arena.len());
            let mut slot = 0u32;
            for (parameter_id, parameter) in &group {
                remap[parameter_id.slot()] = Some((id, slot));
                slot += parameter.len() as u32;
            }
            self.arena.push(UGen {
                kind,
                rate: rate.calculation_rate(),
                special_index,
                inputs,
                input_keys,
                output_count: width,
                scope: self.scope,
                payload: Payload::Control(group.iter().map(|(_, p)| p.clone()).collect()),
            });
            controls.push(id);
            offset += width;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "materialize_controls: {} parameters in {} control nodes",
            parameters.len(),
            controls.len()
        );

        let arena = &self.arena;
        self.order.retain(|id| arena[id.slot()].parameter().is_none());
        self.order.splice(0..0, controls);

        let rates: Vec<CalculationRate> = self.arena.iter().map(|ugen| ugen.rate).collect();
        for id in self.order.clone() {
            for input in &mut self.arena[id.slot()].inputs {
                if let UGenScalar::Output(proxy) = input {
                    if let Some(Some((control, slot))) = remap.get(proxy.node.slot()) {
                        proxy.node = *control;
                        proxy.index += slot;
                        proxy.rate = rates[control.slot()];
                    }
                }
            }
        }
        Ok(())
    }

    /// Gives every FFT-chain consumer but the last its own copy of a shared
    /// chain.
    ///
    /// Chains are processed in place by the server, so a chain read by two
    /// consumers would see the first consumer's changes. Each extra consumer
    /// reads a `PV_Copy` into a fresh `LocalBuf` sized from the chain's FFT
    /// buffer.
    pub(crate) fn cleanup_pv_chains(&mut self) -> Result<(), SynthDefError> {
        let mut consumers: Vec<(NodeId, Vec<(NodeId, usize)>)> = Vec::new();
        for &id in &self.order {
            let ugen = self.ugen(id);
            if !ugen.kind.is_pv() || *ugen.kind == PV_COPY {
                continue;
            }
            for (index, input) in ugen.inputs.iter().enumerate() {
                let Some(proxy) = input.as_output() else {
                    continue;
                };
                if !self.ugen(proxy.node).kind.is_pv() {
                    continue;
                }
                match consumers.iter_mut().find(|(source, _)| *source == proxy.node) {
                    Some((_, readers)) => readers.push((id, index)),
                    None => consumers.push((proxy.node, vec![(id, index)])),
                }
            }
        }

        for (source, readers) in consumers {
            let Some((_, shared)) = readers.split_last() else {
                continue;
            };
            for &(reader, index) in shared {
                let fft_size = self.fft_size(source)?;
                let frames = self.output(fft_size);
                let buffer = self.push(
                    &LOCAL_BUF,
                    CalculationRate::Scalar,
                    vec![
                        (InputKey::Named("channel_count"), UGenScalar::Constant(1.0)),
                        (InputKey::Named("frame_count"), frames),
                        (
                            InputKey::Named("maximum_local_buffers"),
                            UGenScalar::Constant(0.0),
                        ),
                    ],
                );
                let chain = self.arena[reader.slot()].inputs[index];
                let copy_target = self.output(buffer);
                let copy = self.push(
                    &PV_COPY,
                    CalculationRate::Control,
                    vec![
                        (InputKey::Named("pv_chain_a"), chain),
                        (InputKey::Named("pv_chain_b"), copy_target),
                    ],
                );
                self.arena[reader.slot()].inputs[index] = self.output(copy);
                let position = self.position(reader);
                self.order
                    .splice(position..position, [fft_size, buffer, copy]);

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    "cleanup_pv_chains: copy of {} for {}",
                    self.ugen(source).kind.name,
                    self.ugen(reader).kind.name
                );
            }
        }
        Ok(())
    }

    /// Adds a `BufFrames` node reading the FFT buffer at the root of the
    /// chain that `id` belongs to.
    fn fft_size(&mut self, id: NodeId) -> Result<NodeId, SynthDefError> {
        let mut current = id;
        loop {
            let ugen = self.ugen(current);
            match ugen.kind.pv_role {
                PvRole::Source => {
                    let buffer = ugen
                        .inputs
                        .first()
                        .copied()
                        .ok_or(SynthDefError::InvalidAnalysisChain(ugen.kind.name))?;
                    return Ok(self.push(
                        &BUF_FRAMES,
                        CalculationRate::Scalar,
                        vec![(InputKey::Named("buffer_id"), buffer)],
                    ));
                }
                PvRole::Chain => match ugen.inputs.first().and_then(UGenScalar::as_output) {
                    Some(proxy) if self.ugen(proxy.node).kind.is_pv() => current = proxy.node,
                    _ => return Err(SynthDefError::InvalidAnalysisChain(ugen.kind.name)),
                },
                PvRole::None => return Err(SynthDefError::InvalidAnalysisChain(ugen.kind.name)),
            }
        }
    }

    /// Replaces any `MaxLocalBufs` nodes with a single one counting every
    /// `LocalBuf`, placed right before the first of them, and wires each
    /// `LocalBuf` to it.
    pub(crate) fn cleanup_local_bufs(&mut self) {
        let arena = &self.arena;
        self.order.retain(|id| *arena[id.slot()].kind != MAX_LOCAL_BUFS);
        let local_bufs: Vec<NodeId> = self
            .order
            .iter()
            .copied()
            .filter(|id| *self.ugen(*id).kind == LOCAL_BUF)
            .collect();
        let Some(&first) = local_bufs.first() else {
            return;
        };

        let max_local_bufs = self.push(
            &MAX_LOCAL_BUFS,
            CalculationRate::Scalar,
            vec![(
                InputKey::Named("maximum"),
                UGenScalar::Constant(local_bufs.len() as f32),
            )],
        );
        let maximum = self.output(max_local_bufs);
        for id in &local_bufs {
            let ugen = &mut self.arena[id.slot()];
            ugen.inputs.truncate(2);
            ugen.input_keys.truncate(2);
            ugen.inputs.push(maximum);
            ugen.input_keys
                .push(InputKey::Named("maximum_local_buffers"));
        }
        let position = self.position(first);
        self.order.insert(position, max_local_bufs);

        #[cfg(feature = "tracing")]
        tracing::debug!("cleanup_local_bufs: {} local buffers", local_bufs.len());
    }
}
