// Routes messages by category so `ObjectDetectionApp::update` stays a one-liner

use log::{debug, info, warn};
use iced_custom::Task;

use crate::app::{Message, ObjectDetectionApp};
use crate::file_io;

/// Main entry point for handling all messages
pub fn handle_message(app: &mut ObjectDetectionApp, message: Message) -> Task<Message> {
    match message {
        Message::LoadImage | Message::ImageFileSelected(_) | Message::ImageLoaded(_) |
        Message::FileDropped(_) => {
            handle_file_messages(app, message)
        }

        Message::Detect | Message::DetectionFinished(_, _) => {
            handle_detection_messages(app, message)
        }

        Message::PointerMoved(point) => {
            app.scene.pointer_moved(point);
            Task::none()
        }
    }
}

fn handle_file_messages(app: &mut ObjectDetectionApp, message: Message) -> Task<Message> {
    match message {
        Message::LoadImage => {
            Task::perform(file_io::pick_image_file(), Message::ImageFileSelected)
        }
        Message::ImageFileSelected(result) => match result {
            Ok(path) => {
                debug!("Image selected: {}", path.display());
                Task::perform(file_io::load_image(path), Message::ImageLoaded)
            }
            Err(file_io::Error::DialogClosed) => {
                debug!("File dialog closed without a selection");
                Task::none()
            }
            Err(e) => {
                app.load_failed(e);
                Task::none()
            }
        },
        Message::ImageLoaded(result) => {
            match result {
                Ok(image) => app.apply_loaded_image(image),
                Err(e) => app.load_failed(e),
            }
            Task::none()
        }
        Message::FileDropped(path) => {
            if !file_io::has_image_extension(&path) {
                warn!("Dropped file has no known image extension, trying anyway: {}", path.display());
            }
            info!("File dropped: {}", path.display());
            Task::perform(file_io::load_image(path), Message::ImageLoaded)
        }
        _ => Task::none(),
    }
}

fn handle_detection_messages(app: &mut ObjectDetectionApp, message: Message) -> Task<Message> {
    match message {
        Message::Detect => app.start_detection(),
        Message::DetectionFinished(generation, result) => {
            app.finish_detection(generation, result);
            Task::none()
        }
        _ => Task::none(),
    }
}
