// YOLOv8 ONNX export run through ONNX Runtime.
//
// Input:  images  [1, 3, 640, 640] f32, RGB in [0, 1], letterboxed.
// Output: output0 [1, 4 + num_classes, num_anchors], boxes as cx, cy, w, h.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use image::RgbImage;
use ndarray::{Array, ArrayViewD, IxDyn};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use super::{Detection, Detector, DetectorError};
use crate::config::{CONFIDENCE_THRESHOLD, IOU_THRESHOLD, MAX_DETECTIONS, MODEL_INPUT_SIZE};

const LETTERBOX_FILL: f32 = 114.0 / 255.0;

/// How the source image was placed inside the square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_width: u32,
    pub orig_height: u32,
}

impl Letterbox {
    pub fn new(orig_width: u32, orig_height: u32, target_size: u32) -> Self {
        let scale = (target_size as f32 / orig_width.max(1) as f32)
            .min(target_size as f32 / orig_height.max(1) as f32);
        let new_width = ((orig_width as f32 * scale).round() as u32).clamp(1, target_size);
        let new_height = ((orig_height as f32 * scale).round() as u32).clamp(1, target_size);

        Self {
            scale,
            pad_x: ((target_size - new_width) / 2) as f32,
            pad_y: ((target_size - new_height) / 2) as f32,
            orig_width,
            orig_height,
        }
    }

    fn resized_size(&self) -> (u32, u32) {
        let target = |orig: u32| ((orig as f32 * self.scale).round() as u32).max(1);
        (target(self.orig_width), target(self.orig_height))
    }

    /// Map a model-space x1,y1,x2,y2 box back onto the source image, clipped to its bounds.
    pub fn unmap(&self, x1: f32, y1: f32, x2: f32, y2: f32) -> (f32, f32, f32, f32) {
        let w = self.orig_width as f32;
        let h = self.orig_height as f32;
        (
            ((x1 - self.pad_x) / self.scale).clamp(0.0, w),
            ((y1 - self.pad_y) / self.scale).clamp(0.0, h),
            ((x2 - self.pad_x) / self.scale).clamp(0.0, w),
            ((y2 - self.pad_y) / self.scale).clamp(0.0, h),
        )
    }
}

/// Letterbox `img` into a `[1, 3, size, size]` tensor.
pub(crate) fn preprocess_image(
    img: &RgbImage,
    target_size: u32,
) -> Result<(Array<f32, IxDyn>, Letterbox), DetectorError> {
    let (orig_width, orig_height) = img.dimensions();
    if orig_width == 0 || orig_height == 0 {
        return Err(DetectorError::Preprocess(format!("image has no pixels ({}x{})", orig_width, orig_height)));
    }

    let letterbox = Letterbox::new(orig_width, orig_height, target_size);
    let (new_width, new_height) = letterbox.resized_size();
    let resized = image::imageops::resize(img, new_width, new_height, image::imageops::FilterType::Triangle);

    let size = target_size as usize;
    let mut input = Array::from_elem(IxDyn(&[1, 3, size, size]), LETTERBOX_FILL);
    let offset_x = letterbox.pad_x as usize;
    let offset_y = letterbox.pad_y as usize;

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (tx, ty) = (offset_x + x as usize, offset_y + y as usize);
        if tx >= size || ty >= size {
            continue;
        }
        for c in 0..3 {
            input[[0, c, ty, tx]] = pixel[c] as f32 / 255.0;
        }
    }

    Ok((input, letterbox))
}

/// Class-aware non-maximum suppression. Output is sorted by confidence, highest first.
pub(crate) fn nms(detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let mut class_groups: HashMap<u32, Vec<Detection>> = HashMap::new();
    for detection in detections {
        class_groups.entry(detection.class_id).or_default().push(detection);
    }

    let mut kept = Vec::new();
    for (_, mut group) in class_groups {
        group.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let mut suppressed = vec![false; group.len()];

        for i in 0..group.len() {
            if suppressed[i] {
                continue;
            }
            kept.push(group[i]);
            for j in (i + 1)..group.len() {
                if !suppressed[j] && group[i].iou(&group[j]) > iou_threshold {
                    suppressed[j] = true;
                }
            }
        }
    }

    kept.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    kept
}

/// Decode a `[1, 4 + classes, anchors]` output into image-space detections.
pub(crate) fn postprocess_output(
    output: &ArrayViewD<'_, f32>,
    letterbox: &Letterbox,
    confidence_threshold: f32,
    iou_threshold: f32,
    max_detections: usize,
) -> Result<Vec<Detection>, DetectorError> {
    let shape = output.shape();
    if shape.len() != 3 || shape[0] != 1 || shape[1] <= 4 {
        return Err(DetectorError::InvalidOutput(format!(
            "expected [1, 4 + classes, anchors], got {:?}", shape
        )));
    }
    let num_classes = shape[1] - 4;
    let num_anchors = shape[2];

    let mut candidates = Vec::new();
    for i in 0..num_anchors {
        let mut confidence = 0.0f32;
        let mut class_id = 0usize;
        for c in 0..num_classes {
            let score = output[[0, 4 + c, i]];
            if score > confidence {
                confidence = score;
                class_id = c;
            }
        }
        if confidence <= confidence_threshold {
            continue;
        }

        let cx = output[[0, 0, i]];
        let cy = output[[0, 1, i]];
        let w = output[[0, 2, i]];
        let h = output[[0, 3, i]];
        let (x1, y1, x2, y2) = letterbox.unmap(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0);

        candidates.push(Detection {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class_id: class_id as u32,
        });
    }

    let candidate_count = candidates.len();
    let mut detections = nms(candidates, iou_threshold);
    detections.truncate(max_detections);
    debug!("{} candidates above {:.2}, {} after NMS", candidate_count, confidence_threshold, detections.len());

    Ok(detections)
}

pub struct YoloDetector {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    input_size: u32,
}

impl YoloDetector {
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.is_file() {
            return Err(DetectorError::ModelNotFound(model_path.to_path_buf()));
        }

        let start = Instant::now();
        let session = Session::builder()
            .map_err(|e| DetectorError::ModelLoad(format!("failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| DetectorError::ModelLoad(format!("failed to set optimization level: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| DetectorError::ModelLoad(format!("{}: {}", model_path.display(), e)))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| DetectorError::ModelLoad("model declares no inputs".to_string()))?;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| DetectorError::ModelLoad("model declares no outputs".to_string()))?;

        info!(
            "Loaded {} in {:.1} ms (input '{}', output '{}')",
            model_path.display(),
            start.elapsed().as_secs_f64() * 1000.0,
            input_name,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_size: MODEL_INPUT_SIZE,
        })
    }
}

impl Detector for YoloDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, DetectorError> {
        let (input_tensor, letterbox) = preprocess_image(image, self.input_size)?;

        let inference_start = Instant::now();
        let input_value = Value::from_array(input_tensor)
            .map_err(|e| DetectorError::Preprocess(format!("failed to create input value: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectorError::Inference("session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => &input_value])
            .map_err(|e| DetectorError::Inference(e.to_string()))?;
        debug!("Inference completed in {:.1} ms", inference_start.elapsed().as_secs_f64() * 1000.0);

        let output_view = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| DetectorError::InvalidOutput(e.to_string()))?;

        postprocess_output(&output_view, &letterbox, CONFIDENCE_THRESHOLD, IOU_THRESHOLD, MAX_DETECTIONS)
    }
}
